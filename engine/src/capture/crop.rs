//! Pure region cropping. Pixels in, pixels out.

use image::{imageops, DynamicImage, RgbImage, RgbaImage};
use region_watch_common::region::Region;

use super::CaptureError;

/// Cut `region` out of a full-screen RGBA grab and drop the alpha channel.
///
/// The region must lie entirely inside the screen; partial overlap is an
/// error rather than a silently smaller frame.
pub fn crop_region(screen: &RgbaImage, region: &Region) -> Result<RgbImage, CaptureError> {
    if region.is_empty() {
        return Err(CaptureError::EmptyRegion {
            width: region.width(),
            height: region.height(),
        });
    }

    let (screen_w, screen_h) = screen.dimensions();
    let out_of_bounds = CaptureError::OutOfBounds {
        left: region.left(),
        top: region.top(),
        right: region.right(),
        bottom: region.bottom(),
        screen_width: screen_w,
        screen_height: screen_h,
    };

    let (Ok(x), Ok(y)) = (u32::try_from(region.left()), u32::try_from(region.top())) else {
        return Err(out_of_bounds);
    };
    let (width, height) = (region.width(), region.height());
    if u64::from(x) + u64::from(width) > u64::from(screen_w)
        || u64::from(y) + u64::from(height) > u64::from(screen_h)
    {
        return Err(out_of_bounds);
    }

    let cropped = imageops::crop_imm(screen, x, y, width, height).to_image();
    Ok(DynamicImage::ImageRgba8(cropped).to_rgb8())
}
