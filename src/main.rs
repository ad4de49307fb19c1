//! Amber Watch
//!
//! Watches a screen zone for an amber-coloured number, counts how often the
//! stable reading changes, and after a configurable number of changes sends a
//! full-screen screenshot to a Discord webhook.

mod capture;
mod console;
mod logging;
mod monitor;
mod notify;
mod ocr;
mod paths;

use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

use crate::capture::XcapScreen;
use crate::console::{Command, EventPrinter};
use crate::monitor::{create_event_channel, Monitor, MonitorConfig, MonitorEvent};
use crate::ocr::{OcrEngine, TesseractCli};

fn main() -> Result<()> {
    paths::ensure_directories().context("Failed to create application directories")?;
    logging::init()?;
    logging::install_panic_hook();

    info!("Amber Watch started");
    info!("Executable directory: {}", paths::get_exe_dir().display());

    let ocr: Arc<dyn OcrEngine> = match ocr::ensure_tesseract() {
        Ok(tesseract) => {
            info!("Tesseract ready: {}", tesseract.executable.display());
            Arc::new(TesseractCli::new(tesseract))
        }
        Err(e) => {
            warn!("Failed to setup Tesseract: {:#}", e);
            warn!("OCR will not work until Tesseract is installed and on PATH");
            Arc::new(TesseractCli::from_path())
        }
    };

    let config_path = paths::get_config_path();
    let mut config = MonitorConfig::load_from(&config_path);

    let (observer, events) = create_event_channel();
    thread::Builder::new()
        .name("events".to_string())
        .spawn(move || print_events(events))
        .context("Failed to spawn event printer")?;

    let mut monitor = Monitor::new(Arc::new(XcapScreen::new()), ocr, Arc::new(observer))
        .with_archive_dir(paths::get_screenshots_dir());

    println!("{}", console::USAGE);
    println!();
    println!("{}", console::describe(&config, false));

    if config.zone.is_some() {
        console::start_monitor(&mut monitor, &config);
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match console::parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => console::apply(command, &mut monitor, &mut config),
            Err(e) => {
                println!("{}", e);
                println!("{}", console::USAGE);
            }
        }
    }

    monitor.stop();
    if let Err(e) = config.save_to(&config_path) {
        warn!("Failed to save config: {:#}", e);
    }

    // Detached threads end with the process.
    info!("Amber Watch exited");
    Ok(())
}

fn print_events(events: Receiver<MonitorEvent>) {
    let mut printer = EventPrinter::default();
    for event in events {
        if let Some(line) = printer.render(event) {
            println!("{}", line);
        }
    }
}
