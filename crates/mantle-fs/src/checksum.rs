//! SHA-256 checksum utilities
//!
//! Rendered manifests are fingerprinted as `sha256:<hex>` so successive
//! renders of an unchanged fragment set can be compared from the log.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Checksum of in-memory content.
pub fn compute_content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}
