//! The DAV precondition vocabulary surfaced in `<D:error>` bodies.

use super::namespace::Namespace;

/// A named precondition condition carried in an error body.
///
/// The `name` is emitted as an element in `namespace`; names that fail the
/// `[a-z][a-z0-9-]*` shape are sanitized at emission (see
/// [`crate::dav::build::error`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCondition {
    pub namespace: Namespace,
    pub name: String,
}

impl ErrorCondition {
    #[must_use]
    pub fn caldav(name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::CALDAV,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn carddav(name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::CARDDAV,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn dav(name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::DAV,
            name: name.into(),
        }
    }

    /// Whether the condition name is safe to emit as an element name.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let bytes = self.name.as_bytes();
        let Some(&first) = bytes.first() else {
            return false;
        };
        first.is_ascii_lowercase()
            && bytes[1..]
                .iter()
                .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }
}
