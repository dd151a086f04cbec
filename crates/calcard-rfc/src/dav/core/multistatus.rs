//! Multistatus response model (RFC 4918 §13).

use super::property::DavProperty;

/// A `<D:multistatus>` document.
#[derive(Debug, Clone, Default)]
pub struct Multistatus {
    pub responses: Vec<DavResponse>,
    /// `<D:sync-token>` appended after the responses (sync-collection).
    pub sync_token: Option<String>,
}

impl Multistatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, response: DavResponse) {
        self.responses.push(response);
    }
}

/// One `<D:response>`: either propstat groups, or a bare status (used for
/// hrefs that do not resolve, e.g. multiget misses and sync tombstones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub href: String,
    pub status: Option<u16>,
    pub propstats: Vec<Propstat>,
}

impl DavResponse {
    /// A response carrying propstat groups. Empty groups are dropped at
    /// emission.
    #[must_use]
    pub fn with_propstats(href: impl Into<String>, propstats: Vec<Propstat>) -> Self {
        Self {
            href: href.into(),
            status: None,
            propstats,
        }
    }

    /// A status-only response (no propstat), e.g. `404 Not Found`.
    #[must_use]
    pub fn with_status(href: impl Into<String>, status: u16) -> Self {
        Self {
            href: href.into(),
            status: Some(status),
            propstats: Vec::new(),
        }
    }
}

/// A `<D:propstat>` group: properties sharing one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propstat {
    pub status: u16,
    pub props: Vec<DavProperty>,
}

impl Propstat {
    #[must_use]
    pub fn ok(props: Vec<DavProperty>) -> Self {
        Self { status: 200, props }
    }

    #[must_use]
    pub fn not_found(props: Vec<DavProperty>) -> Self {
        Self { status: 404, props }
    }
}

/// Renders a status line the way multistatus bodies carry them.
#[must_use]
pub fn status_line(status: u16) -> String {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        207 => "Multi-Status",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        423 => "Locked",
        507 => "Insufficient Storage",
        _ => "Internal Server Error",
    };
    format!("HTTP/1.1 {status} {reason}")
}
