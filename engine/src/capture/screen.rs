//! Primary-monitor capture using the `xcap` crate.
//!
//! This is the only code that talks to the OS. Region coordinates are
//! relative to the primary monitor's top-left corner.

use image::{RgbImage, RgbaImage};
use region_watch_common::region::Region;
use tracing::debug;
use xcap::Monitor;

use super::{crop_region, CaptureError, FrameSource};

#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenSource;

impl ScreenSource {
    pub fn new() -> Self {
        Self
    }
}

impl FrameSource for ScreenSource {
    fn capture(&self, region: &Region) -> Result<RgbImage, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion {
                width: region.width(),
                height: region.height(),
            });
        }
        let screen = capture_primary_monitor()?;
        debug!(
            screen_w = screen.width(),
            screen_h = screen.height(),
            "grabbed primary monitor"
        );
        crop_region(&screen, region)
    }
}

/// Grab the whole primary monitor. Falls back to the first monitor when none
/// reports itself as primary.
fn capture_primary_monitor() -> Result<RgbaImage, CaptureError> {
    let monitors =
        Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    let primary = monitors
        .into_iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| Monitor::all().ok()?.into_iter().next())
        .ok_or(CaptureError::NoMonitor)?;

    primary
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))
}
