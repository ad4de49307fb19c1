use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";
const TRAINEDDATA_FILE: &str = "eng.traineddata";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

/// Where the Tesseract binary and its language data were found.
#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its compiled-in data directory.
    pub tessdata: Option<PathBuf>,
}

/// Returns the private directory for Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("amber-watch")
        .join("tesseract")
}

/// Locates Tesseract and makes sure English trained data is available,
/// downloading `eng.traineddata` into the private directory if necessary.
pub fn ensure_tesseract() -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;
    info!("Tesseract executable: {}", executable.display());

    let tessdata = match find_tessdata_dir() {
        Some(dir) => dir,
        None if system_has_english(&executable) => {
            info!("Using Tesseract's built-in tessdata directory");
            return Ok(TesseractPaths {
                executable,
                tessdata: None,
            });
        }
        None => {
            let dir = get_tesseract_dir().join("tessdata");
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            download_tessdata(&dir)?;
            dir
        }
    };

    info!("Tesseract ready, tessdata at: {}", tessdata.display());

    Ok(TesseractPaths {
        executable,
        tessdata: Some(tessdata),
    })
}

/// Finds the Tesseract executable, checking our local dir first, then PATH,
/// then the usual Windows install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in windows_install_dirs() {
        let p = dir.join("tesseract.exe");
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing English trained data.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_traineddata(&local_tessdata) {
        return Some(local_tessdata);
    }

    for dir in windows_install_dirs() {
        let p = dir.join("tessdata");
        if has_traineddata(&p) {
            return Some(p);
        }
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_traineddata(&p) {
            return Some(p);
        }
        let p = p.join("tessdata");
        if has_traineddata(&p) {
            return Some(p);
        }
    }

    None
}

fn has_traineddata(dir: &Path) -> bool {
    dir.join(TRAINEDDATA_FILE).exists()
}

fn windows_install_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from(r"C:\Program Files\Tesseract-OCR"),
        PathBuf::from(r"C:\Program Files (x86)\Tesseract-OCR"),
    ];
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        dirs.push(
            PathBuf::from(local)
                .join("Programs")
                .join("Tesseract-OCR"),
        );
    }
    dirs
}

/// Asks the executable whether its default data directory already has `eng`.
fn system_has_english(executable: &Path) -> bool {
    match Command::new(executable).arg("--list-langs").output() {
        Ok(output) if output.status.success() => {
            // Tesseract prints the language list to stdout on 5.x, stderr on older builds
            let listing = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            listing.lines().any(|l| l.trim() == "eng")
        }
        Ok(_) => false,
        Err(e) => {
            warn!("Could not list Tesseract languages: {}", e);
            false
        }
    }
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let eng_url = format!("{}/{}", TESSDATA_REPO, TRAINEDDATA_FILE);
    let eng_path = tessdata_dir.join(TRAINEDDATA_FILE);

    info!("Downloading {}...", TRAINEDDATA_FILE);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "amber-watch")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            TRAINEDDATA_FILE,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)
        .with_context(|| format!("Failed to create {}", eng_path.display()))?;
    file.write_all(&bytes)?;

    info!("Downloaded {} ({} bytes)", TRAINEDDATA_FILE, bytes.len());

    Ok(())
}
