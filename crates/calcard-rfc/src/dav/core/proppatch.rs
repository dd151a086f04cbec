//! PROPPATCH request model (RFC 4918 §9.2).

use super::namespace::QName;

/// A parsed PROPPATCH request: properties to set (with their text values)
/// and properties to remove, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProppatchRequest {
    pub set: Vec<(QName, String)>,
    pub remove: Vec<QName>,
}

impl ProppatchRequest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}
