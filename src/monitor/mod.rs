//! Zone monitoring: the detection-and-decision pipeline.
//!
//! This module provides:
//! - Persisted settings and threshold/delay parsing
//! - A debounce over raw OCR reads (`StabilityFilter`)
//! - Change counting against a threshold (`ChangeAccumulator`)
//! - The delay → capture → notify sequence (`CaptureDispatcher`)
//! - The polling thread and its start/stop lifecycle (`Monitor`)

pub mod changes;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod runner;
pub mod stability;

pub use config::{ChangeThreshold, MonitorConfig};
pub use events::{create_event_channel, MonitorEvent};
pub use runner::Monitor;
