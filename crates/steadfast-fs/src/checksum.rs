//! SHA-256 content fingerprints
//!
//! Provides a single canonical format (`sha256:<hex>`) used to tell a real
//! content change from a metadata-only change.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix for all fingerprints produced by this module
const PREFIX: &str = "sha256:";

/// Digest of an exact byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_bytes(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    /// Digest of a file's current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self::of_bytes(&content))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(PREFIX)?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.strip_prefix(PREFIX).unwrap_or(s);
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(format!("expected 64 hex digits, got {s:?}"));
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| format!("invalid fingerprint {s:?}: {e}"))?;
        }
        Ok(Self(out))
    }
}
