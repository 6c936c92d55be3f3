//! Frame sources.
//!
//! The engine only sees the [`FrameSource`] trait. `screen` grabs the real
//! primary monitor; `in_memory` replays prepared rasters.

mod crop;
mod in_memory;
mod screen;

pub use crop::crop_region;
pub use in_memory::InMemorySource;
pub use screen::ScreenSource;

use image::RgbImage;
use region_watch_common::region::Region;

/// Produces the pixels currently inside a region.
///
/// Capturing is a blocking call; the scheduler runs it on the blocking pool.
pub trait FrameSource: Send + Sync {
    fn capture(&self, region: &Region) -> Result<RgbImage, CaptureError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("no monitor found")]
    NoMonitor,

    #[error("screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("region has zero width or height ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },

    #[error("region ({left},{top})-({right},{bottom}) exceeds screen bounds ({screen_width}x{screen_height})")]
    OutOfBounds {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        screen_width: u32,
        screen_height: u32,
    },
}
