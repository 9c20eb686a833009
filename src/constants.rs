//! Constants used throughout the application

/// Number of points in the face mesh topology
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Number of points when iris refinement is enabled
pub const NUM_REFINED_FACE_MESH_LANDMARKS: usize = 478;

/// Nose tip, drives the cursor and nod detection
pub const NOSE_TIP: usize = 1;

/// Inner upper lip
pub const UPPER_LIP: usize = 13;
/// Inner lower lip
pub const LOWER_LIP: usize = 14;
/// Left mouth corner
pub const MOUTH_LEFT: usize = 78;
/// Right mouth corner
pub const MOUTH_RIGHT: usize = 308;

/// Left eye lower lid
pub const LEFT_EYE_TOP: usize = 145;
/// Left eye upper lid
pub const LEFT_EYE_BOTTOM: usize = 159;
/// Right eye lower lid
pub const RIGHT_EYE_TOP: usize = 374;
/// Right eye upper lid
pub const RIGHT_EYE_BOTTOM: usize = 386;

/// Left face edge
pub const FACE_LEFT: usize = 234;
/// Right face edge
pub const FACE_RIGHT: usize = 454;

/// Highest index read by the geometry extractor
pub const MAX_LANDMARK_INDEX: usize = FACE_RIGHT;

/// Added to the mouth width before dividing
pub const MAR_EPSILON: f64 = 1e-6;

/// Threshold defaults
pub const DEFAULT_SENSITIVITY: f64 = 2.7;
pub const DEFAULT_MOVEMENT_RANGE: f64 = 0.8;
pub const DEFAULT_NOD_THRESHOLD: f64 = 0.03;
pub const DEFAULT_BLINK_THRESHOLD: f64 = 0.047;
pub const DEFAULT_BLINK_DURATION: f64 = 0.1;
pub const DEFAULT_CLICK_INTERVAL: f64 = 0.5;
pub const DEFAULT_RIGHT_CLICK_DURATION: f64 = 2.0;
pub const DEFAULT_DRAG_DURATION: f64 = 0.3;
pub const DEFAULT_DRAG_CONFIRM_DELAY: f64 = 0.3;
pub const DEFAULT_MOUTH_OPEN_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MOUTH_OPEN_DURATION: f64 = 1.0;
pub const DEFAULT_SAFE_MARGIN: u32 = 10;
pub const DEFAULT_SCROLL_AMOUNT: u32 = 850;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 1;

/// Upper bound for the cursor smoothing window
pub const MAX_SMOOTHING_WINDOW: usize = 10;

/// Default screen size when none is configured or queried
pub const DEFAULT_SCREEN_WIDTH: u32 = 1920;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1080;

/// Evaluate one of every N acquired frames
pub const DEFAULT_FRAME_SKIP: u32 = 2;

/// Pause between worker iterations in milliseconds
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 30;

/// Wheel units per scroll notch
pub const SCROLL_UNITS_PER_NOTCH: u32 = 120;
