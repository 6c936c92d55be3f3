use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use image::RgbImage;
use region_watch_common::region::Region;

use super::{CaptureError, FrameSource};

/// Replays prepared captures in order, then keeps returning the last one.
///
/// Ignores the region. Used to drive the engine without a display.
#[derive(Debug, Default)]
pub struct InMemorySource {
    queue: Mutex<VecDeque<Result<RgbImage, CaptureError>>>,
    last: Mutex<Option<Result<RgbImage, CaptureError>>>,
    captures: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        let source = Self::new();
        for frame in frames {
            source.push(frame);
        }
        source
    }

    /// Queue a raster to be returned by a future capture.
    pub fn push(&self, frame: RgbImage) {
        self.push_result(Ok(frame));
    }

    /// Queue a failed capture.
    pub fn push_error(&self, error: CaptureError) {
        self.push_result(Err(error));
    }

    fn push_result(&self, result: Result<RgbImage, CaptureError>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Number of capture calls so far.
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl FrameSource for InMemorySource {
    fn capture(&self, _region: &Region) -> Result<RgbImage, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);

        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(CaptureError::CaptureFailed("no frames queued".into())))
    }
}
