//! Screen capture using `xcap`.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use tracing::{debug, warn};
use xcap::Monitor;

use super::region::Region;

/// Source of screen pixels for the monitor loop.
pub trait ScreenSource: Send + Sync {
    /// Returns the pixels currently under `region`, or `None` when the platform
    /// cannot capture right now (display asleep, monitor unplugged, ...).
    fn capture_region(&self, region: &Region) -> Option<RgbaImage>;

    /// Captures the whole primary display.
    fn capture_full(&self) -> Result<RgbaImage>;
}

/// Desktop capture backed by `xcap` monitors.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapScreen;

impl XcapScreen {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenSource for XcapScreen {
    fn capture_region(&self, region: &Region) -> Option<RgbaImage> {
        match capture_monitor_region(region) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!("Zone capture unavailable: {:#}", e);
                None
            }
        }
    }

    fn capture_full(&self) -> Result<RgbaImage> {
        let monitors = Monitor::all().context("Failed to get monitors")?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary())
            .or(monitors.first())
            .context("No monitor found")?;

        let captured = monitor
            .capture_image()
            .context("Failed to capture screen")?;
        debug!("Full screen captured: {}x{}", captured.width(), captured.height());
        to_rgba_image(captured)
    }
}

/// Captures the monitor that contains `region` and crops it down.
///
/// A zone straddling two monitors, or lying outside all of them, is an error.
fn capture_monitor_region(region: &Region) -> Result<RgbaImage> {
    let monitors = Monitor::all().context("Failed to get monitors")?;

    let monitor = monitors
        .iter()
        .find(|m| monitor_contains((m.x(), m.y(), m.width(), m.height()), region))
        .ok_or_else(|| anyhow!("Zone {} is not inside a single monitor", region))?;

    let captured = monitor
        .capture_image()
        .context("Failed to capture screen")?;
    let full = to_rgba_image(captured)?;

    crop_zone(&full, (monitor.x(), monitor.y()), region)
}

/// Whether a monitor at `(x, y, width, height)` fully covers `region`.
fn monitor_contains(bounds: (i32, i32, u32, u32), region: &Region) -> bool {
    let (mx, my) = (i64::from(bounds.0), i64::from(bounds.1));
    let (rx, ry) = (i64::from(region.x()), i64::from(region.y()));
    rx >= mx
        && ry >= my
        && rx + i64::from(region.width()) <= mx + i64::from(bounds.2)
        && ry + i64::from(region.height()) <= my + i64::from(bounds.3)
}

/// Cuts `region` out of a monitor frame whose top-left sits at `origin`.
/// Fails instead of returning a clamped, smaller image.
fn crop_zone(frame: &RgbaImage, origin: (i32, i32), region: &Region) -> Result<RgbaImage> {
    let x = u32::try_from(i64::from(region.x()) - i64::from(origin.0))
        .map_err(|_| anyhow!("Zone {} starts left of the captured monitor", region))?;
    let y = u32::try_from(i64::from(region.y()) - i64::from(origin.1))
        .map_err(|_| anyhow!("Zone {} starts above the captured monitor", region))?;

    let cropped =
        image::imageops::crop_imm(frame, x, y, region.width(), region.height()).to_image();

    if cropped.dimensions() != (region.width(), region.height()) {
        return Err(anyhow!(
            "Zone {} extends past the captured monitor ({}x{})",
            region,
            frame.width(),
            frame.height()
        ));
    }

    Ok(cropped)
}

/// Moves an `xcap` frame into this crate's `image` buffer type.
fn to_rgba_image(captured: xcap::image::RgbaImage) -> Result<RgbaImage> {
    let (width, height) = (captured.width(), captured.height());
    RgbaImage::from_raw(width, height, captured.into_raw())
        .ok_or_else(|| anyhow!("Captured frame has an unexpected buffer size ({}x{})", width, height))
}
