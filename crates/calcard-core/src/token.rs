//! Sync-token codec (RFC 6578 token surface).
//!
//! Tokens are opaque to clients but structured on the server:
//! `urn:calcard-sync:<kind>:<id>:<nanos>` where `kind` is `cal` or `card`,
//! `id` is the collection id, and `nanos` is the collection's `updated_at`
//! as UTC Unix nanoseconds (0 for the zero time). Any malformation parses
//! to the single [`CoreError::InvalidSyncToken`] sentinel.

use chrono::{DateTime, Utc};

use crate::constants::SYNC_TOKEN_PREFIX;
use crate::error::{CoreError, CoreResult};

/// Which collection family a token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Calendar,
    Addressbook,
}

impl SyncKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "cal",
            Self::Addressbook => "card",
        }
    }

    fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "cal" => Ok(Self::Calendar),
            "card" => Ok(Self::Addressbook),
            _ => Err(CoreError::InvalidSyncToken),
        }
    }
}

/// A decoded sync token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncToken {
    pub kind: SyncKind,
    pub collection_id: i64,
    pub nanos: i64,
}

impl SyncToken {
    /// Builds a token from a collection's `updated_at`.
    #[must_use]
    pub fn new(kind: SyncKind, collection_id: i64, updated_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            collection_id,
            nanos: updated_at.timestamp_nanos_opt().unwrap_or(0),
        }
    }

    /// Parses a serialized token.
    ///
    /// ## Errors
    /// `CoreError::InvalidSyncToken` for a missing prefix, wrong field
    /// count, unknown kind, or non-numeric id/nanos.
    pub fn parse(token: &str) -> CoreResult<Self> {
        let rest = token
            .strip_prefix("urn:")
            .and_then(|r| r.strip_prefix(SYNC_TOKEN_PREFIX))
            .and_then(|r| r.strip_prefix(':'))
            .ok_or(CoreError::InvalidSyncToken)?;

        let fields: Vec<&str> = rest.split(':').collect();
        let [kind, id, nanos] = fields.as_slice() else {
            return Err(CoreError::InvalidSyncToken);
        };

        Ok(Self {
            kind: SyncKind::parse(kind)?,
            collection_id: id.parse().map_err(|_| CoreError::InvalidSyncToken)?,
            nanos: nanos.parse().map_err(|_| CoreError::InvalidSyncToken)?,
        })
    }

    /// The point in time this token captured, as a UTC timestamp.
    #[must_use]
    pub fn since(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos)
    }
}

impl std::fmt::Display for SyncToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "urn:{SYNC_TOKEN_PREFIX}:{}:{}:{}",
            self.kind.as_str(),
            self.collection_id,
            self.nanos
        )
    }
}
