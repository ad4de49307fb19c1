//! Monitor runner - owns the polling thread and the start/stop lifecycle.
//!
//! Each start builds a fresh `MonitorSession` (stability streak, change count,
//! dispatcher) and moves it into one background thread. The only state shared
//! with the caller is the session's running flag.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use super::changes::{ChangeAccumulator, ChangeEvent};
use super::config::{ChangeThreshold, InvalidThreshold, MonitorConfig};
use super::dispatch::CaptureDispatcher;
use super::events::MonitorObserver;
use super::stability::StabilityFilter;
use crate::capture::{Region, ScreenSource};
use crate::notify::Notifier;
use crate::ocr::{read_amber_value, OcrEngine};

/// Pause between two polls of the zone.
pub const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Pause before retrying when the zone could not be captured.
pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Pause after a cycle blew up.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum StartError {
    #[error("Please select a zone first!")]
    NoRegion,
    #[error(transparent)]
    InvalidThreshold(#[from] InvalidThreshold),
    #[error("Failed to spawn monitor thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// The zone could not be captured; nothing else advanced
    CaptureUnavailable,
    /// The frame went through the pipeline (with or without a read)
    Polled,
}

/// Everything one monitoring run owns.
pub struct MonitorSession {
    region: Region,
    screen: Arc<dyn ScreenSource>,
    ocr: Arc<dyn OcrEngine>,
    observer: Arc<dyn MonitorObserver>,
    stability: StabilityFilter,
    changes: ChangeAccumulator,
    dispatcher: CaptureDispatcher,
}

impl MonitorSession {
    pub fn new(
        region: Region,
        threshold: ChangeThreshold,
        dispatcher: CaptureDispatcher,
        screen: Arc<dyn ScreenSource>,
        ocr: Arc<dyn OcrEngine>,
        observer: Arc<dyn MonitorObserver>,
    ) -> Self {
        Self {
            region,
            screen,
            ocr,
            observer,
            stability: StabilityFilter::new(),
            changes: ChangeAccumulator::new(threshold),
            dispatcher,
        }
    }

    /// Runs one capture → read → debounce → count → (dispatch) pass.
    pub fn poll_once(&mut self) -> Cycle {
        let Some(zone) = self.screen.capture_region(&self.region) else {
            debug!("Zone capture unavailable, retrying");
            return Cycle::CaptureUnavailable;
        };

        let detected = read_amber_value(&zone, self.ocr.as_ref());
        if let Some(value) = &detected {
            debug!("Detected value: {}", value);
            self.observer.on_detected(value);
        }

        let Some(stable) = self.stability.observe(detected.as_deref()) else {
            return Cycle::Polled;
        };
        let stable = stable.to_string();

        match self.changes.observe(&stable) {
            ChangeEvent::Initial(value) => {
                info!("Initial value: {}", value);
                self.observer.on_status(&format!("Initial value: {}", value));
            }
            ChangeEvent::Unchanged => {}
            ChangeEvent::Changed {
                old,
                new,
                count,
                fire,
            } => {
                info!("Change detected: {} → {} ({} so far)", old, new, count);
                self.observer.on_change_count(count);
                self.observer
                    .on_status(&format!("Change detected: {} → {}", old, new));

                if fire {
                    let outcome =
                        self.dispatcher
                            .dispatch(&new, &mut self.changes, self.observer.as_ref());
                    debug!("Dispatch finished: {:?}", outcome);
                }
            }
        }

        Cycle::Polled
    }

    /// Polls until `running` is cleared. Panics inside a cycle are reported and
    /// followed by `ERROR_BACKOFF`; they never end the loop.
    fn run(mut self, running: Arc<AtomicBool>) {
        info!("Monitor loop started for zone {}", self.region);

        while running.load(Ordering::SeqCst) {
            let wait = match panic::catch_unwind(AssertUnwindSafe(|| self.poll_once())) {
                Ok(Cycle::Polled) => POLL_INTERVAL,
                Ok(Cycle::CaptureUnavailable) => CAPTURE_RETRY_DELAY,
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    error!("Monitor error: {}", msg);
                    self.observer.on_status(&format!("Monitor error: {}", msg));
                    ERROR_BACKOFF
                }
            };
            thread::sleep(wait);
        }

        info!("Monitor loop finished");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

struct ActiveSession {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Handle used by the front end to start and stop monitoring.
pub struct Monitor {
    screen: Arc<dyn ScreenSource>,
    ocr: Arc<dyn OcrEngine>,
    observer: Arc<dyn MonitorObserver>,
    archive_dir: Option<std::path::PathBuf>,
    active: Option<ActiveSession>,
    /// Thread of a stopped session that may still be finishing its cycle
    stopping: Option<JoinHandle<()>>,
}

impl Monitor {
    pub fn new(
        screen: Arc<dyn ScreenSource>,
        ocr: Arc<dyn OcrEngine>,
        observer: Arc<dyn MonitorObserver>,
    ) -> Self {
        Self {
            screen,
            ocr,
            observer,
            archive_dir: None,
            active: None,
            stopping: None,
        }
    }

    /// Directory used when the config asks to keep screenshots.
    pub fn with_archive_dir(mut self, dir: std::path::PathBuf) -> Self {
        self.archive_dir = Some(dir);
        self
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a new session from `config`. Does nothing if one is already running.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No zone is configured
    /// - The change threshold is neither an integer nor "-"
    /// - The monitor thread cannot be spawned
    pub fn start(
        &mut self,
        config: &MonitorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(), StartError> {
        if self.is_running() {
            debug!("Start requested while already running, ignoring");
            return Ok(());
        }

        let region = config.zone.ok_or(StartError::NoRegion)?;
        let threshold = config.threshold()?;
        let delay = config.delay();

        self.finish_stopped_session();

        let mut dispatcher = CaptureDispatcher::new(delay, self.screen.clone(), notifier);
        if config.keep_screenshots {
            if let Some(dir) = &self.archive_dir {
                dispatcher = dispatcher.with_archive_dir(dir.clone());
            }
        }

        let session = MonitorSession::new(
            region,
            threshold,
            dispatcher,
            self.screen.clone(),
            self.ocr.clone(),
            self.observer.clone(),
        );

        info!(
            "Starting monitor: zone {}, threshold {}, delay {}s",
            region,
            threshold,
            delay.as_secs_f64()
        );

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("monitor".to_string())
            .spawn(move || session.run(thread_running))?;

        self.active = Some(ActiveSession { running, handle });
        self.observer.on_status("Monitoring started...");
        self.observer.on_change_count(0);

        Ok(())
    }

    /// Signals the running session to stop and returns at once. Does nothing if idle.
    ///
    /// The worker exits after its current cycle; a capture already waiting out
    /// its delay still goes out. The next `start` waits for that thread first.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.running.store(false, Ordering::SeqCst);
        self.stopping = Some(active.handle);

        info!("Monitoring stopped");
        self.observer.on_status("Monitoring stopped.");
    }

    /// Joins the previous session's thread so two sessions never overlap.
    fn finish_stopped_session(&mut self) {
        let Some(handle) = self.stopping.take() else {
            return;
        };
        if !handle.is_finished() {
            info!("Waiting for the previous session to finish its cycle");
        }
        if handle.join().is_err() {
            error!("Monitor thread panicked");
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        // Detaches the worker; it sees the cleared flag and exits on its own.
        self.stop();
    }
}
