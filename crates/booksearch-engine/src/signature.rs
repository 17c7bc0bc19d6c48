//! Canonical cache keys for provider requests.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::source::Request;

/// SHA-256 digest of a provider name, operation identity and ordered
/// parameter list.
///
/// Every component is length-prefixed before hashing, so `("ab", "c")` and
/// `("a", "bc")` never produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSignature([u8; 32]);

impl RequestSignature {
    pub fn new(provider: &str, request: &Request) -> Self {
        let mut hasher = Sha256::new();
        write_part(&mut hasher, provider);
        write_part(&mut hasher, request.operation());
        for (key, value) in request.params() {
            write_part(&mut hasher, key);
            write_part(&mut hasher, &value);
        }
        Self(hasher.finalize().into())
    }

    /// Full lowercase hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

fn write_part(hasher: &mut Sha256, part: &str) {
    hasher.update((part.len() as u64).to_be_bytes());
    hasher.update(part.as_bytes());
}

impl fmt::Display for RequestSignature {
    /// Short form for log lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..6]))
    }
}
