//! One-way notifications from the monitor loop to whatever presents them.
//!
//! Uses std::sync::mpsc so the loop never waits on the consumer: sends go into an
//! unbounded queue, and a vanished receiver is silently ignored.

use std::sync::mpsc::{channel, Receiver, Sender};

/// Receives status text, raw detections and change counts from the loop.
///
/// Implementations must return quickly and must not panic.
pub trait MonitorObserver: Send + Sync {
    fn on_status(&self, text: &str);
    fn on_detected(&self, value: &str);
    fn on_change_count(&self, count: u32);
}

/// Something the monitor loop wants the user to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Status(String),
    Detected(String),
    ChangeCount(u32),
}

/// Forwards observations into a channel.
#[derive(Clone)]
pub struct ChannelObserver {
    sender: Sender<MonitorEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<MonitorEvent>) -> Self {
        Self { sender }
    }

    fn emit(&self, event: MonitorEvent) {
        // Receiver gone means nobody is watching; the loop carries on.
        let _ = self.sender.send(event);
    }
}

impl MonitorObserver for ChannelObserver {
    fn on_status(&self, text: &str) {
        self.emit(MonitorEvent::Status(text.to_string()));
    }

    fn on_detected(&self, value: &str) {
        self.emit(MonitorEvent::Detected(value.to_string()));
    }

    fn on_change_count(&self, count: u32) {
        self.emit(MonitorEvent::ChangeCount(count));
    }
}

/// Creates an observer and the receiver that drains it.
pub fn create_event_channel() -> (ChannelObserver, Receiver<MonitorEvent>) {
    let (sender, receiver) = channel();
    (ChannelObserver::new(sender), receiver)
}
