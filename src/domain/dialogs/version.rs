//! Version fingerprints for dialogs and dialog containers.
//!
//! A fingerprint is the SHA-256 of a signature string. Signatures are built
//! by concatenating the pure `signature_contribution()` of each dialog, so a
//! container never depends on the order its own fields were assigned in.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 digest of a dialog signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionFingerprint(String);

impl VersionFingerprint {
    /// Hashes an already-assembled signature string.
    pub fn of(signature: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(signature.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VersionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incrementally assembles a signature.
///
/// Every part is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// produce different signatures.
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    buffer: String,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: &str) -> &mut Self {
        self.buffer.push_str(&part.len().to_string());
        self.buffer.push(':');
        self.buffer.push_str(part);
        self.buffer.push(';');
        self
    }

    pub fn push_field(&mut self, key: &str, value: &str) -> &mut Self {
        self.push(key).push(value)
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn finish(&self) -> VersionFingerprint {
        VersionFingerprint::of(&self.buffer)
    }
}
