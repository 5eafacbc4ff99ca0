use thiserror::Error;

/// The only failure a rope reports: an index or range outside the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RopeError {
    #[error("index {index} is out of bounds for a rope of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}
