//! Slug rules for human-readable calendar identifiers.
//!
//! Slugs are lowercase, alphanumeric with interior hyphens, and resolve
//! case-insensitively against a principal's accessible calendars. A slug
//! made of digits only would collide with id-addressed paths, so generated
//! slugs are never fully numeric.

/// Maximum accepted slug length.
pub const MAX_SLUG_LEN: usize = 64;

/// Checks a slug against `^[a-z0-9]([a-z0-9-]{0,62}[a-z0-9])?$`.
///
/// First and last characters must be alphanumeric; interior characters may
/// also be hyphens. Uppercase, separators, and path traversal are rejected.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    let bytes = slug.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_SLUG_LEN {
        return false;
    }

    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let interior_ok = |b: u8| edge_ok(b) || b == b'-';

    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return false;
    }

    bytes.iter().all(|&b| interior_ok(b))
}

/// Generate a URL-safe slug from a name.
///
/// Converts to lowercase, replaces runs of non-alphanumeric characters with
/// a single hyphen, and trims edge hyphens.
///
/// Examples:
/// - "My Calendar" -> "my-calendar"
/// - "Work & Personal" -> "work-personal"
#[must_use]
pub fn generate_slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    // A fully numeric slug would be indistinguishable from an id segment.
    if !slug.is_empty() && slug.bytes().all(|b| b.is_ascii_digit()) {
        format!("cal-{slug}")
    } else {
        slug
    }
}
