use thiserror::Error;

/// Storage failures. `NotFound` is a distinct variant so callers can
/// branch on "absent" without string matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Internal(String),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
