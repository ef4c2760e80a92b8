//! Incremental change fingerprints.

use sha2::{Digest, Sha256};

/// SHA-256 accumulator for content-change fingerprints.
///
/// Each field is length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// produce different fingerprints.
#[derive(Clone, Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one field.
    pub fn update(&mut self, field: impl AsRef<[u8]>) {
        let field = field.as_ref();
        self.hasher.update((field.len() as u64).to_le_bytes());
        self.hasher.update(field);
    }

    /// Append one field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl AsRef<[u8]>) -> Self {
        self.update(field);
        self
    }

    /// Lowercase hex digest.
    #[must_use]
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
