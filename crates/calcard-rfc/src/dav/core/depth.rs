//! The `Depth` request header (RFC 4918 §10.2).

/// Parsed `Depth` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    Zero,
    #[default]
    One,
    Infinity,
}

impl Depth {
    /// Parses a `Depth` header value. An absent header defaults to 1 for
    /// PROPFIND on this server.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("0") => Self::Zero,
            Some(v) if v.eq_ignore_ascii_case("infinity") => Self::Infinity,
            _ => Self::One,
        }
    }
}
