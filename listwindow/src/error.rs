use thiserror::Error;

/// Errors raised while mapping indexes to offsets.
///
/// The calculator never returns these to its caller: a failed computation falls back to the
/// last committed window. They surface through custom [`crate::PositionIndex`] implementations
/// and through [`crate::PrecomputeJob::run_slice`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    #[error("item {index} reported an invalid height ({height})")]
    InvalidHeight { index: usize, height: f64 },

    #[error("index {index} is out of bounds for {count} items")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("a consumer hook panicked during {stage}")]
    Panicked { stage: &'static str },
}
