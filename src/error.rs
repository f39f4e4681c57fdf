//! Caller-facing error taxonomy for the forum core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForumError {
    /// The target entity is missing, soft-deleted, or not owned by the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A concurrent conflicting write was detected twice in a row for the
    /// same key; the operation was already retried once before escalating.
    #[error("conflicting concurrent write")]
    Conflict,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type ForumResult<T> = Result<T, ForumError>;
