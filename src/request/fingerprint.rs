use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FingerprintError {
    #[error("cannot fingerprint an empty file list")]
    EmptyFileList,
}

/// Sorts and deduplicates a key list into the canonical form every
/// fingerprint is computed over.
pub fn canonical_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Order-independent identity of a file set: the SHA-256 of the sorted,
/// deduplicated keys. Each key is length-prefixed before hashing so that
/// keys containing any separator cannot collide with a reshuffled set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_keys<I, S>(keys: I) -> Result<Self, FingerprintError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = canonical_keys(keys);
        if keys.is_empty() {
            return Err(FingerprintError::EmptyFileList);
        }

        let mut hasher = Sha256::new();
        for key in &keys {
            hasher.update((key.len() as u64).to_le_bytes());
            hasher.update(key.as_bytes());
        }
        Ok(Fingerprint(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the archive object in the destination bucket.
    pub fn archive_object_name(&self) -> String {
        format!("{}.zip", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
