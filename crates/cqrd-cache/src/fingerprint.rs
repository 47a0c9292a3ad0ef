//! Deterministic content fingerprinting for cache keys.

use sha2::{Digest, Sha256};

/// Hex chars kept from the SHA-256 digest. 64 bits is plenty for cache-key
/// disambiguation and keeps composite keys short.
const FINGERPRINT_LEN: usize = 16;

/// Derives a deterministic fingerprint of `content`.
///
/// Same input produces the same output within a process and across restarts.
/// The result is lowercase hex of fixed length, safe to embed in composite
/// cache keys. This is a disambiguator, not a security primitive.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex = format!("{digest:x}");
    hex[..FINGERPRINT_LEN].to_owned()
}
