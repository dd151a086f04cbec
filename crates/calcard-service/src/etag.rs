//! Content-addressed entity tags.
//!
//! An ETag is the SHA-256 of the stored body as lowercase hex, so
//! identical bodies always carry identical tags regardless of when or
//! where they were written.

use sha2::{Digest, Sha256};

/// Computes the ETag for a payload.
#[must_use]
pub fn content_etag(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Wraps an ETag in the quotes HTTP headers carry it in.
#[must_use]
pub fn quoted(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// Strips surrounding quotes (and a weak-validator prefix) from a header
/// ETag for comparison.
#[must_use]
pub fn normalize(header_value: &str) -> &str {
    header_value
        .trim()
        .trim_start_matches("W/")
        .trim_matches('"')
}
