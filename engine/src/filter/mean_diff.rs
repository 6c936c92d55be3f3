use region_watch_common::frame::Frame;
use tracing::debug;

use super::traits::DifferencePolicy;

/// Mean absolute per-sample difference between two same-shaped frames.
///
/// Every R, G and B sample counts once. Returns `None` when the shapes differ.
/// An empty pair has a mean of `0.0`.
pub fn mean_abs_diff(a: &Frame, b: &Frame) -> Option<f64> {
    if a.shape() != b.shape() {
        return None;
    }
    let (a, b) = (a.samples(), b.samples());
    if a.is_empty() {
        return Some(0.0);
    }
    let total: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    Some(total as f64 / a.len() as f64)
}

/// Global intensity-difference filter.
///
/// Keeps a frame when the mean absolute difference against the reference
/// strictly exceeds the threshold. Coarse on purpose: small rendering noise
/// stays under the threshold, and a large change confined to a small part of
/// an otherwise static frame can be diluted below it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanAbsoluteDifference;

impl DifferencePolicy for MeanAbsoluteDifference {
    fn should_retain(&self, candidate: &Frame, reference: Option<&Frame>, threshold: u32) -> bool {
        let Some(reference) = reference else {
            debug!(seq = candidate.seq, "history empty, accepting unconditionally");
            return true;
        };

        match mean_abs_diff(candidate, reference) {
            None => {
                debug!(
                    candidate = ?candidate.shape(),
                    reference = ?reference.shape(),
                    "frame shape changed, accepting as novel"
                );
                true
            }
            Some(mean) => {
                let accepted = mean > f64::from(threshold);
                debug!(
                    mean = format!("{:.3}", mean),
                    threshold,
                    accepted,
                    "mean difference comparison"
                );
                accepted
            }
        }
    }

    fn name(&self) -> &str {
        "mean_abs_diff"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(RgbImage::from_pixel(w, h, Rgb([value; 3])), 0, 0)
    }

    #[test]
    fn identical_frames_have_zero_difference() {
        let a = solid(16, 9, 77);
        assert_eq!(mean_abs_diff(&a, &a.clone()), Some(0.0));
    }

    #[test]
    fn difference_is_symmetric_without_wraparound() {
        let dark = solid(4, 4, 10);
        let light = solid(4, 4, 250);
        assert_eq!(mean_abs_diff(&dark, &light), Some(240.0));
        assert_eq!(mean_abs_diff(&light, &dark), Some(240.0));
    }

    #[test]
    fn averages_over_every_channel_sample() {
        // One pixel differs by 90 in the red channel only: 90 / (2*2*3) = 7.5
        let a = solid(2, 2, 0);
        let mut pixels = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        pixels.put_pixel(1, 1, Rgb([90, 0, 0]));
        let b = Frame::new(pixels, 0, 0);
        assert_eq!(mean_abs_diff(&a, &b), Some(7.5));
    }

    #[test]
    fn shape_mismatch_has_no_mean() {
        assert_eq!(mean_abs_diff(&solid(4, 4, 0), &solid(4, 5, 0)), None);
    }

    #[test]
    fn empty_frames_have_zero_mean() {
        assert_eq!(mean_abs_diff(&solid(0, 0, 0), &solid(0, 0, 0)), Some(0.0));
    }

    #[test]
    fn first_frame_always_retained() {
        assert!(MeanAbsoluteDifference.should_retain(&solid(2, 2, 0), None, 255));
    }

    #[test]
    fn shape_change_always_retained() {
        let policy = MeanAbsoluteDifference;
        assert!(policy.should_retain(&solid(3, 3, 5), Some(&solid(2, 2, 5)), 255));
    }

    #[test]
    fn threshold_is_strict() {
        let policy = MeanAbsoluteDifference;
        let reference = solid(8, 8, 100);
        assert!(!policy.should_retain(&solid(8, 8, 110), Some(&reference), 10));
        assert!(policy.should_retain(&solid(8, 8, 111), Some(&reference), 10));
        assert!(!policy.should_retain(&solid(8, 8, 95), Some(&reference), 10));
    }

    #[test]
    fn retain_matches_mean_over_threshold_range() {
        let policy = MeanAbsoluteDifference;
        let reference = solid(3, 2, 128);
        for value in [0u8, 64, 120, 127, 128, 129, 140, 200, 255] {
            let candidate = solid(3, 2, value);
            let mean = mean_abs_diff(&candidate, &reference).unwrap();
            for threshold in [1u32, 8, 10, 64, 127, 128, 255] {
                assert_eq!(
                    policy.should_retain(&candidate, Some(&reference), threshold),
                    mean > f64::from(threshold),
                    "value {value} threshold {threshold}"
                );
            }
        }
    }
}
