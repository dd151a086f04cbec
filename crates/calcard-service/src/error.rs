use thiserror::Error;

use calcard_store::StoreError;

/// Service layer errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("ambiguous calendar reference: {0}")]
    AmbiguousSlug(String),

    #[error("invalid sync token")]
    InvalidSyncToken,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Rfc(#[from] calcard_rfc::error::RfcError),

    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other),
        }
    }
}

impl From<calcard_core::error::CoreError> for ServiceError {
    fn from(err: calcard_core::error::CoreError) -> Self {
        match err {
            calcard_core::error::CoreError::InvalidSyncToken => Self::InvalidSyncToken,
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
