use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned when inserting into an [`IntervalTree`](crate::IntervalTree).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The lower bound of the interval is greater than its upper bound.
    #[error("invalid interval: [{start}, {end}]")]
    InvalidInterval { start: u64, end: u64 },

    /// The interval intersects one already stored in the tree. `value` is
    /// the first boundary found in conflict.
    #[error("tried to insert value already inserted: {value}")]
    Overlap { value: u64 },
}
