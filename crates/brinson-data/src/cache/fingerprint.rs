//! Content fingerprints for workbook sources.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest identifying a source's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

/// Incremental fingerprint builder.
///
/// Every part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
#[derive(Debug, Clone, Default)]
pub struct FingerprintHasher {
    hasher: Sha256,
}

impl FingerprintHasher {
    /// Start a new fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one part.
    pub fn update_part(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Finish and encode the digest.
    pub fn finish(self) -> Fingerprint {
        Fingerprint(hex::encode(self.hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_hex_sha256() {
        let fp = FingerprintHasher::new().finish();
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(fp.short().len(), 12);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_parts_same_digest() {
        let mut a = FingerprintHasher::new();
        a.update_part(b"prices.csv");
        let mut b = FingerprintHasher::new();
        b.update_part(b"prices.csv");
        assert_eq!(a.finish(), b.finish());
    }
}
