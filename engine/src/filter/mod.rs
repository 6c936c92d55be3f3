pub mod mean_diff;
pub mod traits;

pub use mean_diff::{mean_abs_diff, MeanAbsoluteDifference};
pub use traits::DifferencePolicy;
