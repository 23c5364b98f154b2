use thiserror::Error;

/// Errors reported by the trees, collections and maps of this crate.
///
/// Every variant describes a violated precondition of the call that returned it.
/// Nothing here is transient, so retrying the same call yields the same error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("no element greater than the provided value")]
    NoElementGreaterThan,

    #[error("no element greater than or equal to the provided value")]
    NoElementGreaterOrEqual,

    #[error("no element less than the provided value")]
    NoElementLessThan,

    #[error("no element less than or equal to the provided value")]
    NoElementLessOrEqual,

    #[error("the container is empty")]
    Empty,

    #[error("key not found")]
    KeyNotFound,

    #[error("input is not sorted at position {position}")]
    Unsorted { position: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
