//! Frame worker lifecycle: skipping, pacing, shutdown and drag release


use face_gesture_control::{
    actions::{Action, RecordingSink},
    app::{FrameWorker, WorkerSettings},
    engine::GestureEngine,
    landmarks::{Acquisition, LandmarkSource, MemorySource},
    thresholds::{MemoryPersistence, ThresholdCommand, ThresholdStore},
    utils::FixedStepClock,
    Error, Result,
};
use std::{
    sync::{atomic::Ordering, Arc, Mutex},
    thread,
    time::Duration,
};
use test_helpers::*;

fn worker(frame_skip: u32) -> (FrameWorker, Arc<Mutex<GestureEngine>>, Arc<ThresholdStore>) {
    let engine = Arc::new(Mutex::new(test_engine()));
    let store = Arc::new(ThresholdStore::open(Box::new(MemoryPersistence::default())));
    let settings = WorkerSettings {
        frame_skip,
        frame_interval: Duration::ZERO,
    };
    let worker = FrameWorker::new(Arc::clone(&engine), Arc::clone(&store), settings);
    (worker, engine, store)
}

fn faces(faces: Vec<face_gesture_control::landmarks::LandmarkSet>) -> MemorySource {
    MemorySource::new(faces.into_iter().map(Acquisition::Face).collect())
}

/// Source that keeps yielding the same face until told to stop
struct EndlessSource {
    face: Acquisition,
}

impl LandmarkSource for EndlessSource {
    fn acquire(&mut self) -> Result<Acquisition> {
        thread::sleep(Duration::from_millis(1));
        Ok(self.face.clone())
    }

    fn name(&self) -> &str {
        "endless"
    }
}

/// Source that fails every other read
struct FlakySource {
    reads: u32,
}

impl LandmarkSource for FlakySource {
    fn acquire(&mut self) -> Result<Acquisition> {
        self.reads += 1;
        match self.reads {
            n if n > 6 => Ok(Acquisition::EndOfStream),
            n if n % 2 == 0 => Err(Error::LandmarkSource("camera hiccup".to_string())),
            _ => Ok(Acquisition::Face(open_face())),
        }
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[test]
fn test_every_frame_evaluated_without_skipping() -> Result<()> {
    let (worker, _, _) = worker(1);
    let mut source = faces(vec![open_face(), open_face(), open_face()]);
    let mut sink = RecordingSink::new();

    let report = worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert_eq!(report.acquired, 3);
    assert_eq!(report.evaluated, 3);
    assert_eq!(sink.actions().len(), 3);
    Ok(())
}

#[test]
fn test_frame_skip_evaluates_every_nth_frame() -> Result<()> {
    let (worker, engine, _) = worker(2);
    let mut source = faces((0..5).map(|_| open_face()).collect());
    let mut sink = RecordingSink::new();

    let report = worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert_eq!(report.acquired, 5);
    assert_eq!(report.evaluated, 2);
    assert_eq!(engine.lock().unwrap().status().frames, 2);
    Ok(())
}

#[test]
fn test_no_face_frames_are_evaluated_without_actions() -> Result<()> {
    let (worker, engine, _) = worker(1);
    let mut source = MemorySource::new(vec![Acquisition::NoFace, Acquisition::NoFace]);
    let mut sink = RecordingSink::new();

    let report = worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert_eq!(report.evaluated, 2);
    assert!(sink.actions().is_empty());
    assert!(!engine.lock().unwrap().status().face_present);
    Ok(())
}

#[test]
fn test_acquire_errors_are_skipped() -> Result<()> {
    let (worker, _, _) = worker(1);
    let mut source = FlakySource { reads: 0 };
    let mut sink = RecordingSink::new();

    let report = worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert_eq!(report.acquire_errors, 3);
    assert_eq!(report.evaluated, 3);
    Ok(())
}

#[test]
fn test_end_of_stream_releases_drag() -> Result<()> {
    let (worker, _, _) = worker(1);
    let mut source = faces((0..10).map(|_| left_wink_face()).collect());
    let mut sink = RecordingSink::new();

    worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert_eq!(sink.discrete_actions(), vec![Action::DragStart, Action::DragEnd]);
    Ok(())
}

#[test]
fn test_shutdown_flag_stops_spawned_worker_and_releases_drag() -> Result<()> {
    let (worker, engine, _) = worker(1);
    let sink = RecordingSink::new();
    let source = EndlessSource {
        face: Acquisition::Face(left_wink_face()),
    };

    let handle = worker.spawn(Box::new(source), Box::new(sink.clone()), Box::new(FixedStepClock::new(0.1)))?;

    // Wait for the drag to start
    for _ in 0..500 {
        if sink.discrete_actions().contains(&Action::DragStart) {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert!(sink.discrete_actions().contains(&Action::DragStart));

    handle.request_shutdown();
    let report = handle.join()?;
    assert!(report.evaluated >= 7);
    assert_eq!(sink.discrete_actions().last(), Some(&Action::DragEnd));
    assert!(!engine.lock().unwrap().status().dragging);
    Ok(())
}

#[test]
fn test_pending_reset_is_consumed_before_first_frame() -> Result<()> {
    let (worker, _, _) = worker(1);
    let reset = worker.reset_flag();
    let mut source = faces((0..10).map(|_| left_wink_face()).collect());
    let mut sink = RecordingSink::new();

    // Raised before the run: applied ahead of the first frame, nothing to release
    reset.store(true, Ordering::SeqCst);
    worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert!(!reset.load(Ordering::SeqCst));
    assert_eq!(sink.discrete_actions(), vec![Action::DragStart, Action::DragEnd]);
    Ok(())
}

#[test]
fn test_threshold_change_is_seen_by_next_frame() -> Result<()> {
    let (worker, _, store) = worker(1);
    for _ in 0..10 {
        store.apply(ThresholdCommand::IncreaseNodThreshold)?;
    }
    // nod_threshold is now 0.04, a 0.035 nod no longer scrolls
    let mut source = faces(vec![face_with_nose_y(0.5), face_with_nose_y(0.535)]);
    let mut sink = RecordingSink::new();

    worker.run(&mut source, &mut sink, &mut FixedStepClock::new(0.1))?;
    assert!(sink.discrete_actions().is_empty());
    Ok(())
}
