//! The monitored screen rectangle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum width and height, in pixels, of a usable zone.
pub const MIN_REGION_EXTENT: i32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("zone corners are inverted (x1 < x2 and y1 < y2 required)")]
    Inverted,
    #[error("zone is too small: {width}x{height} (minimum {MIN_REGION_EXTENT}x{MIN_REGION_EXTENT})")]
    TooSmall { width: i64, height: i64 },
}

/// Axis-aligned rectangle in screen coordinates, `(x1, y1)` inclusive top-left,
/// `(x2, y2)` exclusive bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[i32; 4]", into = "[i32; 4]")]
pub struct Region {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl Region {
    /// Builds a region from already-ordered corners.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, RegionError> {
        if x1 >= x2 || y1 >= y2 {
            return Err(RegionError::Inverted);
        }
        let (width, height) = (span(x1, x2), span(y1, y2));
        if width < i64::from(MIN_REGION_EXTENT) || height < i64::from(MIN_REGION_EXTENT) {
            return Err(RegionError::TooSmall { width, height });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Builds a region from two arbitrary drag corners, ordering them first.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Result<Self, RegionError> {
        Self::new(a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
    }

    pub fn x(&self) -> i32 {
        self.x1
    }

    pub fn y(&self) -> i32 {
        self.y1
    }

    pub fn width(&self) -> u32 {
        span(self.x1, self.x2) as u32
    }

    pub fn height(&self) -> u32 {
        span(self.y1, self.y2) as u32
    }

    pub fn corners(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Distance between two coordinates. Never exceeds `u32::MAX` for `i32` input.
fn span(from: i32, to: i32) -> i64 {
    i64::from(to) - i64::from(from)
}

impl TryFrom<[i32; 4]> for Region {
    type Error = RegionError;

    fn try_from(c: [i32; 4]) -> Result<Self, Self::Error> {
        Region::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Region> for [i32; 4] {
    fn from(region: Region) -> Self {
        region.corners()
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) to ({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}
