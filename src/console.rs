//! Console front end: line commands in, monitor events out.
//!
//! Stands in for the desktop window: `start`/`stop` replace the F1/F3 hotkeys,
//! `zone` replaces the drag-to-select overlay, and the remaining commands edit
//! the same settings the window's entry fields did.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::capture::Region;
use crate::monitor::{ChangeThreshold, Monitor, MonitorConfig, MonitorEvent};
use crate::notify::DiscordWebhook;

pub const USAGE: &str = "\
Commands:
  start                   start monitoring (F1)
  stop                    stop monitoring (F3)
  zone <x1> <y1> <x2> <y2> set the monitored zone
  changes <n | ->         changes before a screenshot, '-' to disable
  delay <seconds>         wait before the screenshot
  webhook <url>           webhook that receives screenshots
  status                  show current settings
  quit                    save settings and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Zone(Region),
    Changes(String),
    Delay(String),
    Webhook(String),
    Status,
    Quit,
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<Command> {
    let mut parts = line.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| anyhow!("Empty command"))?
        .to_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match (name.as_str(), args.as_slice()) {
        ("start", []) => Command::Start,
        ("stop", []) => Command::Stop,
        ("status", []) => Command::Status,
        ("quit" | "exit", []) => Command::Quit,
        ("zone", [x1, y1, x2, y2]) => {
            let corner = |s: &str| {
                s.parse::<i32>()
                    .map_err(|_| anyhow!("Invalid coordinate: {}", s))
            };
            let region = Region::from_corners(
                (corner(*x1)?, corner(*y1)?),
                (corner(*x2)?, corner(*y2)?),
            )?;
            Command::Zone(region)
        }
        ("changes", [value]) => {
            value.parse::<ChangeThreshold>()?;
            Command::Changes(value.to_string())
        }
        ("delay", [value]) => Command::Delay(value.to_string()),
        ("webhook", [url]) => Command::Webhook(url.to_string()),
        ("webhook", []) => Command::Webhook(String::new()),
        _ => return Err(anyhow!("Unknown command: {}", line.trim())),
    };

    Ok(command)
}

/// Starts monitoring with the current settings, reporting why it refused.
pub fn start_monitor(monitor: &mut Monitor, config: &MonitorConfig) {
    let notifier = Arc::new(DiscordWebhook::new(config.webhook.clone()));
    if let Err(e) = monitor.start(config, notifier) {
        warn!("Start rejected: {}", e);
        println!("Warning: {}", e);
    }
}

/// Applies a non-quit command to the monitor and settings.
pub fn apply(command: Command, monitor: &mut Monitor, config: &mut MonitorConfig) {
    match command {
        Command::Start => start_monitor(monitor, config),
        Command::Stop => monitor.stop(),
        Command::Zone(region) => {
            config.zone = Some(region);
            info!("Zone selected: {}", region);
            println!("Zone selected: {}. Ready to start.", region);
            note_restart(monitor);
        }
        Command::Changes(value) => {
            config.changes = value;
            note_restart(monitor);
        }
        Command::Delay(value) => {
            let parsed = crate::monitor::config::parse_delay(&value);
            config.delay = value;
            println!("Delay: {}s", parsed.as_secs_f64());
            note_restart(monitor);
        }
        Command::Webhook(url) => {
            config.webhook = url.trim().to_string();
            note_restart(monitor);
        }
        Command::Status => println!("{}", describe(config, monitor.is_running())),
        Command::Quit => {}
    }
}

fn note_restart(monitor: &Monitor) {
    if monitor.is_running() {
        println!("Setting saved; it applies the next time monitoring starts.");
    }
}

/// One-paragraph summary of the current settings.
pub fn describe(config: &MonitorConfig, running: bool) -> String {
    let zone = config
        .zone
        .map(|z| z.to_string())
        .unwrap_or_else(|| "not selected".to_string());
    let webhook = if config.webhook.is_empty() {
        "not set"
    } else {
        "set"
    };
    format!(
        "Monitoring: {}\nZone: {}\nChanges: {}\nDelay: {}s\nWebhook: {}",
        if running { "running" } else { "stopped" },
        zone,
        config.changes,
        config.delay().as_secs_f64(),
        webhook
    )
}

/// Turns monitor events into console lines, skipping repeated detections.
#[derive(Debug, Default)]
pub struct EventPrinter {
    last_detected: Option<String>,
}

impl EventPrinter {
    pub fn render(&mut self, event: MonitorEvent) -> Option<String> {
        match event {
            MonitorEvent::Status(text) => Some(text),
            MonitorEvent::Detected(value) => {
                if self.last_detected.as_deref() == Some(value.as_str()) {
                    return None;
                }
                let line = format!("Detected value: {}", value);
                self.last_detected = Some(value);
                Some(line)
            }
            MonitorEvent::ChangeCount(count) => Some(format!("Changes: {}", count)),
        }
    }
}
