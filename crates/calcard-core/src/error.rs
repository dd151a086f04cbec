use thiserror::Error;

/// Errors raised by the foundation crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    #[error("invalid sync token")]
    InvalidSyncToken,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
