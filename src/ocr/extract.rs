use anyhow::Result;
use image::GrayImage;
use regex::Regex;
use tracing::{debug, warn};

use super::engine::{OcrEngine, DIGIT_MODES};

/// Maximal runs of consecutive digits.
const DIGIT_RUN_PATTERN: &str = r"[0-9]+";

/// Returns the longest digit run in `text`. Ties go to the earliest run.
pub fn longest_digit_run<'a>(text: &'a str, digit_run: &Regex) -> Option<&'a str> {
    digit_run
        .find_iter(text)
        .map(|m| m.as_str())
        .fold(None, |best: Option<&str>, run| match best {
            Some(b) if b.len() >= run.len() => Some(b),
            _ => Some(run),
        })
}

/// Runs OCR under every digit mode and keeps the longest digit run found.
///
/// A failing mode contributes nothing; any other failure yields `None` for the frame.
pub fn decode_digits(engine: &dyn OcrEngine, img: &GrayImage) -> Option<String> {
    match try_decode_digits(engine, img) {
        Ok(value) => value,
        Err(e) => {
            warn!("Extract error: {:#}", e);
            None
        }
    }
}

fn try_decode_digits(engine: &dyn OcrEngine, img: &GrayImage) -> Result<Option<String>> {
    let digit_run = Regex::new(DIGIT_RUN_PATTERN)?;
    let mut best: Option<String> = None;

    for mode in DIGIT_MODES {
        let text = match engine.recognize(img, mode) {
            Ok(text) => text,
            Err(e) => {
                debug!("OCR psm {} failed: {:#}", mode.psm(), e);
                continue;
            }
        };

        if let Some(run) = longest_digit_run(&text, &digit_run) {
            debug!("OCR psm {}: {:?} -> {}", mode.psm(), text.trim(), run);
            if best.as_ref().is_none_or(|b| run.len() > b.len()) {
                best = Some(run.to_string());
            }
        }
    }

    Ok(best)
}
