//! Main application module for face gesture control.
//!
//! Landmark acquisition and gesture evaluation run on a dedicated frame
//! worker. The control thread owns the tuning channel: it applies threshold
//! commands, logs status periodically and asks the worker to stop.

use crate::{
    actions::{Action, ActionSink, LogSink},
    config::{AppConfig, CaptureConfig},
    cursor_control::CursorController,
    cursor_mapper::{CursorMapper, ScreenSize},
    engine::GestureEngine,
    keyboard::{shared, CommandKeyboard, KeyboardHandle},
    landmarks::{Acquisition, LandmarkSource},
    replay::ReplaySource,
    thresholds::{MemoryPersistence, ThresholdCommand, ThresholdPersistence, ThresholdStore, YamlFilePersistence},
    utils::{Clock, MonotonicClock},
    Error, Result,
};
use crossbeam_channel::{bounded, never, select, tick, unbounded, Receiver, Sender};
use log::{debug, error, info, warn};
use std::{
    io::BufRead,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// Frame loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Evaluate every Nth acquired frame
    pub frame_skip: u32,
    /// Delay after each iteration
    pub frame_interval: Duration,
}

impl From<&CaptureConfig> for WorkerSettings {
    fn from(capture: &CaptureConfig) -> Self {
        Self {
            frame_skip: capture.frame_skip.max(1),
            frame_interval: capture.frame_interval(),
        }
    }
}

/// Counters for one worker run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Frames read from the source
    pub acquired: u64,
    /// Frames handed to the gesture engine
    pub evaluated: u64,
    /// Transient acquisition failures
    pub acquire_errors: u64,
    /// Actions dispatched to the sink
    pub actions: u64,
    /// Actions the sink failed to execute
    pub sink_errors: u64,
}

/// Frame processing loop
pub struct FrameWorker {
    engine: Arc<Mutex<GestureEngine>>,
    store: Arc<ThresholdStore>,
    settings: WorkerSettings,
    shutdown: Arc<AtomicBool>,
    reset_requested: Arc<AtomicBool>,
}

impl FrameWorker {
    #[must_use]
    pub fn new(engine: Arc<Mutex<GestureEngine>>, store: Arc<ThresholdStore>, settings: WorkerSettings) -> Self {
        Self {
            engine,
            store,
            settings,
            shutdown: Arc::new(AtomicBool::new(false)),
            reset_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the loop at the top of its next iteration
    #[must_use]
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Flag that resets every gesture machine before the next frame
    #[must_use]
    pub fn reset_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.reset_requested)
    }

    /// Run until the shutdown flag is set or the source ends.
    ///
    /// A held drag is always released before returning normally.
    pub fn run(
        &self,
        source: &mut dyn LandmarkSource,
        sink: &mut dyn ActionSink,
        clock: &mut dyn Clock,
    ) -> Result<WorkerReport> {
        info!("Frame worker started ({})", source.name());
        let mut report = WorkerReport::default();

        while !self.shutdown.load(Ordering::SeqCst) {
            if self.reset_requested.swap(false, Ordering::SeqCst) {
                let released = self.lock_engine()?.reset();
                Self::dispatch(sink, &released, &mut report);
            }

            let acquisition = match source.acquire() {
                Ok(Acquisition::EndOfStream) => {
                    info!("Landmark source {} ended", source.name());
                    break;
                }
                Ok(acquisition) => acquisition,
                Err(e) => {
                    warn!("Failed to acquire frame: {e}");
                    report.acquire_errors += 1;
                    self.pace();
                    continue;
                }
            };

            report.acquired += 1;
            if report.acquired % u64::from(self.settings.frame_skip) != 0 {
                continue;
            }

            let thresholds = match self.store.snapshot() {
                Ok(thresholds) => thresholds,
                Err(e) => {
                    error!("Skipping frame: {e}");
                    continue;
                }
            };

            let landmarks = match &acquisition {
                Acquisition::Face(set) => Some(set),
                _ => None,
            };

            let actions = {
                let mut engine = self.lock_engine()?;
                engine.process(landmarks, &thresholds, clock.now())
            };
            report.evaluated += 1;

            Self::dispatch(sink, &actions, &mut report);
            self.pace();
        }

        let released = self.lock_engine()?.shutdown();
        Self::dispatch(sink, &released, &mut report);

        info!(
            "Frame worker stopped: {} frames acquired, {} evaluated, {} actions",
            report.acquired, report.evaluated, report.actions
        );
        Ok(report)
    }

    /// Move the worker onto its own thread
    pub fn spawn(
        self,
        mut source: Box<dyn LandmarkSource>,
        mut sink: Box<dyn ActionSink>,
        mut clock: Box<dyn Clock>,
    ) -> Result<WorkerHandle> {
        let shutdown = self.shutdown_flag();
        let reset = self.reset_flag();
        let (done_tx, done_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name("frame-worker".to_string())
            .spawn(move || {
                let result = self.run(source.as_mut(), sink.as_mut(), clock.as_mut());
                if done_tx.send(result).is_err() {
                    debug!("Nobody waiting for the frame worker");
                }
            })?;

        Ok(WorkerHandle {
            shutdown,
            reset,
            done: done_rx,
            thread,
        })
    }

    fn lock_engine(&self) -> Result<std::sync::MutexGuard<'_, GestureEngine>> {
        self.engine.lock().map_err(|_| Error::LockPoisoned("gesture engine"))
    }

    fn dispatch(sink: &mut dyn ActionSink, actions: &[Action], report: &mut WorkerReport) {
        for action in actions {
            report.actions += 1;
            if let Err(e) = sink.dispatch(action) {
                warn!("Failed to execute {action}: {e}");
                report.sink_errors += 1;
            }
        }
    }

    fn pace(&self) {
        if !self.settings.frame_interval.is_zero() {
            thread::sleep(self.settings.frame_interval);
        }
    }
}

/// Handle to a running frame worker
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
    done: Receiver<Result<WorkerReport>>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Ask the worker to stop after the current frame
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Ask the worker to reset every gesture machine
    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::SeqCst);
    }

    /// Receives the worker result once it stops
    #[must_use]
    pub fn done(&self) -> &Receiver<Result<WorkerReport>> {
        &self.done
    }

    /// Wait for the worker to stop
    pub fn join(self) -> Result<WorkerReport> {
        let received = self.done.recv().ok();
        self.join_with(received)
    }

    fn join_with(self, received: Option<Result<WorkerReport>>) -> Result<WorkerReport> {
        self.thread
            .join()
            .map_err(|_| Error::Worker("frame worker panicked".to_string()))?;
        received.unwrap_or_else(|| Err(Error::Worker("frame worker exited without a result".to_string())))
    }
}

/// Operator command read from the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Adjust a threshold
    Tune(ThresholdCommand),
    /// Reset every gesture machine, releasing any drag
    ResetGestures,
    /// Log the current status
    Status,
    /// Stop the application
    Quit,
}

impl FromStr for ControlCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "status" => Ok(Self::Status),
            "reset-gestures" => Ok(Self::ResetGestures),
            other => other.parse().map(Self::Tune),
        }
    }
}

/// Forward commands read line by line to `commands` until EOF or the receiver goes away
pub fn read_commands<R: BufRead>(reader: R, commands: &Sender<ControlCommand>) -> Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<ControlCommand>() {
            Ok(command) => {
                if commands.send(command).is_err() {
                    break;
                }
            }
            Err(e) => warn!("{e}"),
        }
    }
    Ok(())
}

/// Read commands from stdin on a background thread
pub fn spawn_stdin_commands() -> Result<Receiver<ControlCommand>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            if let Err(e) = read_commands(stdin.lock(), &tx) {
                warn!("Stopped reading commands: {e}");
            }
        })?;
    Ok(rx)
}

/// Main application struct
pub struct GestureApp {
    config: AppConfig,
    store: Arc<ThresholdStore>,
    engine: Arc<Mutex<GestureEngine>>,
    source: Box<dyn LandmarkSource>,
    sink: Box<dyn ActionSink>,
    clock: Box<dyn Clock>,
}

impl GestureApp {
    /// Build the application from configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing face gesture control");

        let persistence: Box<dyn ThresholdPersistence> = if config.thresholds.persist {
            info!("Thresholds stored in {}", config.thresholds.path.display());
            Box::new(YamlFilePersistence::new(&config.thresholds.path))
        } else {
            Box::new(MemoryPersistence::default())
        };

        let path = config
            .source
            .landmarks
            .as_ref()
            .ok_or_else(|| Error::ConfigError("No landmark source configured".to_string()))?;
        let source = Box::new(ReplaySource::open(path)?);

        let (sink, screen): (Box<dyn ActionSink>, ScreenSize) = if config.sink.dry_run {
            info!("Dry run, actions are only logged");
            (Box::new(LogSink), config.screen.size())
        } else {
            let controller = CursorController::new()?;
            info!("X11 cursor control initialized");
            let screen = if config.screen.auto_detect {
                controller.screen_size()
            } else {
                config.screen.size()
            };
            (Box::new(controller), screen)
        };
        info!("Mapping cursor onto {}x{}", screen.width, screen.height);

        let keyboard = shared(CommandKeyboard::new(
            config.keyboard.program.clone(),
            config.keyboard.args.clone(),
        ));

        Self::from_parts(config, screen, source, sink, keyboard, persistence)
    }

    /// Build the application around explicit collaborators
    pub fn from_parts(
        config: AppConfig,
        screen: ScreenSize,
        source: Box<dyn LandmarkSource>,
        sink: Box<dyn ActionSink>,
        keyboard: KeyboardHandle,
        persistence: Box<dyn ThresholdPersistence>,
    ) -> Result<Self> {
        let store = Arc::new(ThresholdStore::open(persistence));

        let mapper = match config.create_filter()? {
            Some(filter) => {
                info!("Cursor smoothing fixed to {}", filter.name());
                CursorMapper::with_filter(screen, filter)
            }
            None => CursorMapper::new(screen),
        };
        let engine = Arc::new(Mutex::new(GestureEngine::with_cursor_mapper(mapper, keyboard)));

        Ok(Self {
            config,
            store,
            engine,
            source,
            sink,
            clock: Box::new(MonotonicClock::start()),
        })
    }

    /// Replace the frame clock
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shared threshold store
    #[must_use]
    pub fn store(&self) -> Arc<ThresholdStore> {
        Arc::clone(&self.store)
    }

    /// Shared gesture engine
    #[must_use]
    pub fn engine(&self) -> Arc<Mutex<GestureEngine>> {
        Arc::clone(&self.engine)
    }

    /// Run until the source ends or a quit command arrives
    pub fn run(self, commands: Receiver<ControlCommand>) -> Result<WorkerReport> {
        info!("Starting frame worker");

        let worker = FrameWorker::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.store),
            WorkerSettings::from(&self.config.capture),
        );
        let handle = worker.spawn(self.source, self.sink, self.clock)?;

        let status_ticks = match self.config.capture.status_interval_secs {
            0 => never(),
            secs => tick(Duration::from_secs(secs)),
        };
        let mut commands_closed = false;
        let mut finished = None;

        loop {
            let active_commands = if commands_closed { never() } else { commands.clone() };
            select! {
                recv(active_commands) -> command => match command {
                    Ok(ControlCommand::Tune(command)) => {
                        if let Err(e) = self.store.apply(command) {
                            warn!("{e}");
                        }
                    }
                    Ok(ControlCommand::ResetGestures) => handle.request_reset(),
                    Ok(ControlCommand::Status) => log_status(&self.engine),
                    Ok(ControlCommand::Quit) => {
                        info!("Exit requested by user");
                        handle.request_shutdown();
                        break;
                    }
                    Err(_) => {
                        debug!("Command channel closed");
                        commands_closed = true;
                    }
                },
                recv(handle.done()) -> result => {
                    finished = Some(result.ok());
                    break;
                }
                recv(status_ticks) -> _ => log_status(&self.engine),
            }
        }

        let result = match finished {
            Some(received) => handle.join_with(received),
            None => handle.join(),
        };
        info!("Application shutting down");
        result
    }
}

fn log_status(engine: &Mutex<GestureEngine>) {
    match engine.lock() {
        Ok(engine) => info!("Status: {}", engine.status()),
        Err(_) => warn!("Status unavailable, gesture engine lock poisoned"),
    }
}
