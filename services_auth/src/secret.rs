//! Secret encoding

use sha2::{Digest, Sha256};

/// One-way encoding of a presented secret
///
/// Unsalted SHA-256, hex encoded. Stable across runs so stored fixtures
/// keep verifying; not suitable for real credentials.
pub fn encode_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
