use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Characters Tesseract is allowed to emit when reading the counter.
pub const DIGIT_WHITELIST: &str = "0123456789";

/// Tesseract page segmentation assumptions used for digit reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSegMode {
    /// `--psm 7`: treat the image as a single text line
    SingleLine,
    /// `--psm 8`: treat the image as a single word
    SingleWord,
    /// `--psm 6`: assume a single uniform block of text
    UniformBlock,
}

impl PageSegMode {
    pub fn psm(self) -> u8 {
        match self {
            PageSegMode::SingleLine => 7,
            PageSegMode::SingleWord => 8,
            PageSegMode::UniformBlock => 6,
        }
    }
}

/// Order in which the decoder tries segmentation modes. Earlier modes win ties.
pub const DIGIT_MODES: [PageSegMode; 3] = [
    PageSegMode::SingleLine,
    PageSegMode::SingleWord,
    PageSegMode::UniformBlock,
];

/// Black-box text recognition, restricted to the digit whitelist.
pub trait OcrEngine: Send + Sync {
    /// Returns the raw recognised text for `img` under `mode`.
    fn recognize(&self, img: &GrayImage, mode: PageSegMode) -> Result<String>;
}

/// Runs the `tesseract` command-line tool once per call.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(paths: TesseractPaths) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
        }
    }

    /// Falls back to whatever `tesseract` resolves to on PATH.
    pub fn from_path() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            tessdata: None,
        }
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, img: &GrayImage, mode: PageSegMode) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg("eng")
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(mode.psm().to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", DIGIT_WHITELIST))
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
