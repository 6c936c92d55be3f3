use std::io::Cursor;

use image::{ImageFormat, RgbImage, RgbaImage};

/// One captured RGB snapshot of a region with timestamp metadata.
///
/// The raster is immutable once built; frames are shared between the history
/// store and renderers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
    pub captured_at_ms: i64,
    pub seq: u64,
}

impl Frame {
    pub fn new(pixels: RgbImage, captured_at_ms: i64, seq: u64) -> Self {
        Self {
            pixels,
            captured_at_ms,
            seq,
        }
    }

    /// Drop the alpha channel of a screen grab.
    pub fn from_rgba(pixels: RgbaImage, captured_at_ms: i64, seq: u64) -> Self {
        let rgb = image::DynamicImage::ImageRgba8(pixels).to_rgb8();
        Self::new(rgb, captured_at_ms, seq)
    }

    // -- Convenience accessors --------------------------------------------------

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)`; the channel count is always 3.
    pub fn shape(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Interleaved RGB samples, row-major.
    pub fn samples(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Capture time as a UTC timestamp, falling back to now if out of range.
    pub fn captured_at(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.captured_at_ms)
            .unwrap_or_else(chrono::Utc::now)
    }

    // -- Rendering ----------------------------------------------------------------

    pub fn to_png(&self) -> Result<Vec<u8>, FrameError> {
        let mut png_bytes: Vec<u8> = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(png_bytes)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
