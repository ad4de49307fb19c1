//! Screen capture for the monitored zone and for full-screen notifications.
//!
//! This module provides:
//! - The zone rectangle (`Region`)
//! - The capture seam used by the monitor loop (`ScreenSource`)
//! - The `xcap`-backed desktop implementation (`XcapScreen`)

pub mod region;
pub mod screenshot;

pub use region::Region;
pub use screenshot::{ScreenSource, XcapScreen};
