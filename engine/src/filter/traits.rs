use region_watch_common::frame::Frame;

/// Decides whether a freshly captured frame is different enough from the
/// last stored one to be kept.
pub trait DifferencePolicy: Send + Sync {
    /// Returns `true` if `candidate` should be stored.
    /// `reference` is the newest stored frame, or `None` when history is empty.
    fn should_retain(&self, candidate: &Frame, reference: Option<&Frame>, threshold: u32) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
