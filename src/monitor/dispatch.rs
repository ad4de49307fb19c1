//! Delay → full-screen capture → notify, once the change threshold fires.

use chrono::Local;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::changes::ChangeAccumulator;
use super::events::MonitorObserver;
use crate::capture::ScreenSource;
use crate::notify::{NotifyError, Notifier};

/// How the pause before the capture is carried out.
pub type Pause = Box<dyn Fn(Duration) + Send + Sync>;

/// Result of one dispatch, for logging and tests.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    NotifyFailed(NotifyError),
    CaptureFailed(String),
}

pub struct CaptureDispatcher {
    delay: Duration,
    screen: Arc<dyn ScreenSource>,
    notifier: Arc<dyn Notifier>,
    archive_dir: Option<PathBuf>,
    pause: Pause,
}

impl CaptureDispatcher {
    pub fn new(
        delay: Duration,
        screen: Arc<dyn ScreenSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            delay,
            screen,
            notifier,
            archive_dir: None,
            pause: Box::new(std::thread::sleep),
        }
    }

    /// Also saves every capture as PNG under `dir`.
    pub fn with_archive_dir(mut self, dir: PathBuf) -> Self {
        self.archive_dir = Some(dir);
        self
    }

    /// Replaces the blocking sleep used for the pre-capture delay.
    pub fn with_pause(mut self, pause: Pause) -> Self {
        self.pause = pause;
        self
    }

    /// Waits the configured delay, captures the whole screen and hands it to the
    /// notifier together with `value`. The change count is zeroed whatever happens.
    pub fn dispatch(
        &self,
        value: &str,
        changes: &mut ChangeAccumulator,
        observer: &dyn MonitorObserver,
    ) -> DispatchOutcome {
        let outcome = self.capture_and_send(value, observer);

        changes.reset_count();
        observer.on_change_count(0);

        outcome
    }

    fn capture_and_send(&self, value: &str, observer: &dyn MonitorObserver) -> DispatchOutcome {
        let secs = self.delay.as_secs_f64();
        info!("Threshold reached at {}, waiting {}s before screenshot", value, secs);
        observer.on_status(&format!("Waiting {}s before screenshot...", secs));
        (self.pause)(self.delay);

        observer.on_status("Taking screenshot...");
        let screenshot = match self.screen.capture_full() {
            Ok(img) => img,
            Err(e) => {
                warn!("Full screen capture failed: {:#}", e);
                observer.on_status(&format!("Error: screenshot failed: {}", e));
                return DispatchOutcome::CaptureFailed(e.to_string());
            }
        };

        if let Some(dir) = &self.archive_dir {
            archive_screenshot(dir, &screenshot, value);
        }

        match self.notifier.send(&screenshot, value) {
            Ok(()) => {
                info!("Screenshot sent for value {}", value);
                observer.on_status(&format!("Screenshot sent! Value: {}", value));
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!("Notification failed: {}", e);
                observer.on_status(&notify_failure_status(&e));
                DispatchOutcome::NotifyFailed(e)
            }
        }
    }
}

fn notify_failure_status(e: &NotifyError) -> String {
    match e {
        NotifyError::NotConfigured => format!("Error: {}", e),
        _ => e.to_string(),
    }
}

/// Best effort: a failed save is logged and otherwise ignored.
fn archive_screenshot(dir: &Path, screenshot: &RgbaImage, value: &str) {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{}.png", timestamp, value));

    if let Err(e) = fs::create_dir_all(dir) {
        warn!("Failed to create {}: {}", dir.display(), e);
        return;
    }
    match screenshot.save(&path) {
        Ok(()) => info!("Screenshot saved to {}", path.display()),
        Err(e) => warn!("Failed to save screenshot {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Region;
    use crate::monitor::config::{parse_delay, ChangeThreshold};
    use crate::monitor::events::{create_event_channel, MonitorEvent};
    use anyhow::{anyhow, Result};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FullScreen {
        available: bool,
    }

    impl ScreenSource for FullScreen {
        fn capture_region(&self, _region: &Region) -> Option<RgbaImage> {
            None
        }

        fn capture_full(&self) -> Result<RgbaImage> {
            if self.available {
                Ok(RgbaImage::new(8, 6))
            } else {
                Err(anyhow!("display asleep"))
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<(u32, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, screenshot: &RgbaImage, value: &str) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((screenshot.width(), value.to_string()));
            if self.fail {
                Err(NotifyError::Rejected { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    fn recording_pause() -> (Pause, Arc<Mutex<Vec<Duration>>>) {
        let pauses = Arc::new(Mutex::new(Vec::new()));
        let recorded = pauses.clone();
        let pause: Pause = Box::new(move |d| recorded.lock().unwrap().push(d));
        (pause, pauses)
    }

    fn fired_accumulator() -> ChangeAccumulator {
        let mut acc = ChangeAccumulator::new(ChangeThreshold::Count(1));
        acc.observe("1");
        acc.observe("2");
        assert_eq!(acc.change_count(), 1);
        acc
    }

    #[test]
    fn test_dispatch_waits_captures_and_sends() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (pause, pauses) = recording_pause();
        let dispatcher = CaptureDispatcher::new(
            Duration::from_millis(1500),
            Arc::new(FullScreen { available: true }),
            notifier.clone(),
        )
        .with_pause(pause);
        let (observer, events) = create_event_channel();
        let mut acc = fired_accumulator();

        let outcome = dispatcher.dispatch("2", &mut acc, &observer);

        assert!(matches!(outcome, DispatchOutcome::Sent));
        assert_eq!(*pauses.lock().unwrap(), vec![Duration::from_millis(1500)]);
        assert_eq!(*notifier.sent.lock().unwrap(), vec![(8, "2".to_string())]);
        assert_eq!(acc.change_count(), 0);

        let events: Vec<MonitorEvent> = events.try_iter().collect();
        assert_eq!(
            events,
            vec![
                MonitorEvent::Status("Waiting 1.5s before screenshot...".to_string()),
                MonitorEvent::Status("Taking screenshot...".to_string()),
                MonitorEvent::Status("Screenshot sent! Value: 2".to_string()),
                MonitorEvent::ChangeCount(0),
            ]
        );
    }

    #[test]
    fn test_fallback_delay_is_still_waited() {
        let (pause, pauses) = recording_pause();
        let dispatcher = CaptureDispatcher::new(
            parse_delay("not a number"),
            Arc::new(FullScreen { available: true }),
            Arc::new(RecordingNotifier::default()),
        )
        .with_pause(pause);
        let (observer, _events) = create_event_channel();
        let mut acc = fired_accumulator();

        dispatcher.dispatch("2", &mut acc, &observer);

        assert_eq!(*pauses.lock().unwrap(), vec![Duration::from_secs(3)]);
    }

    #[test]
    fn test_notify_failure_still_resets_count() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let (pause, _) = recording_pause();
        let dispatcher = CaptureDispatcher::new(
            Duration::ZERO,
            Arc::new(FullScreen { available: true }),
            notifier.clone(),
        )
        .with_pause(pause);
        let (observer, events) = create_event_channel();
        let mut acc = fired_accumulator();

        let outcome = dispatcher.dispatch("2", &mut acc, &observer);

        assert!(matches!(
            outcome,
            DispatchOutcome::NotifyFailed(NotifyError::Rejected { status: 500 })
        ));
        assert_eq!(acc.change_count(), 0);
        let events: Vec<MonitorEvent> = events.try_iter().collect();
        assert!(events.contains(&MonitorEvent::Status("Webhook error: 500".to_string())));
        assert_eq!(events.last(), Some(&MonitorEvent::ChangeCount(0)));
    }

    #[test]
    fn test_capture_failure_skips_notify_and_resets_count() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (pause, _) = recording_pause();
        let dispatcher = CaptureDispatcher::new(
            Duration::ZERO,
            Arc::new(FullScreen { available: false }),
            notifier.clone(),
        )
        .with_pause(pause);
        let (observer, _events) = create_event_channel();
        let mut acc = fired_accumulator();

        let outcome = dispatcher.dispatch("2", &mut acc, &observer);

        assert!(matches!(outcome, DispatchOutcome::CaptureFailed(_)));
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(acc.change_count(), 0);
    }

    #[test]
    fn test_archive_dir_receives_png() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("screenshots");
        let (pause, _) = recording_pause();
        let dispatcher = CaptureDispatcher::new(
            Duration::ZERO,
            Arc::new(FullScreen { available: true }),
            Arc::new(RecordingNotifier::default()),
        )
        .with_archive_dir(archive.clone())
        .with_pause(pause);
        let (observer, _events) = create_event_channel();
        let mut acc = fired_accumulator();

        dispatcher.dispatch("8192", &mut acc, &observer);

        let saved: Vec<_> = fs::read_dir(&archive).unwrap().flatten().collect();
        assert_eq!(saved.len(), 1);
        let name = saved[0].file_name().to_string_lossy().to_string();
        assert!(name.ends_with("_8192.png"), "unexpected file name {}", name);
    }

    #[test]
    fn test_not_configured_status() {
        assert_eq!(
            notify_failure_status(&NotifyError::NotConfigured),
            "Error: No webhook URL provided"
        );
    }

    /// Shared call log for checking the order of pause, capture and send.
    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    struct LoggingScreen(CallLog);

    impl ScreenSource for LoggingScreen {
        fn capture_region(&self, _region: &Region) -> Option<RgbaImage> {
            None
        }

        fn capture_full(&self) -> Result<RgbaImage> {
            self.0.lock().unwrap().push("capture");
            Ok(RgbaImage::new(4, 4))
        }
    }

    struct LoggingNotifier(CallLog);

    impl Notifier for LoggingNotifier {
        fn send(&self, _screenshot: &RgbaImage, _value: &str) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push("send");
            Ok(())
        }
    }

    #[test]
    fn test_pause_happens_before_capture() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let pause_calls = calls.clone();
        let dispatcher = CaptureDispatcher::new(
            Duration::from_secs(2),
            Arc::new(LoggingScreen(calls.clone())),
            Arc::new(LoggingNotifier(calls.clone())),
        )
        .with_pause(Box::new(move |_| pause_calls.lock().unwrap().push("pause")));
        let (observer, _events) = create_event_channel();
        let mut acc = fired_accumulator();

        dispatcher.dispatch("2", &mut acc, &observer);

        assert_eq!(*calls.lock().unwrap(), vec!["pause", "capture", "send"]);
    }
}
