//! Task-list fingerprinting.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the raw bytes of `path`.
pub fn hash_file(path: &Path) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(hash_bytes(&contents))
}

pub fn hash_bytes(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_raw_bytes_as_lowercase_hex() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tasks.md");
        fs::write(&path, "abc").expect("write");

        let hash = hash_file(&path).expect("hash");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn empty_file_has_well_known_digest() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn missing_file_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(hash_file(&temp.path().join("missing.md")).is_err());
    }
}
