//! # SHA-256 File Hashing
//!
//! Content-addressing primitive for the prelude cache: every materialised
//! spec file is checksummed so the cache can detect tampering or partial
//! downloads without re-fetching anything.
//!
//! The digest is rendered as lowercase hex so it round-trips through JSON
//! and compares byte-for-byte across platforms (no endianness or path
//! separator sensitivity - only the file's bytes matter).

use crate::errors::CryptoError;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// SHA-256 digest, lowercase hex encoded.
pub type Checksum = String;

/// Stateful SHA-256 hasher for incremental input.
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Feed more bytes into the running digest.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Consume the hasher and return the hex digest.
    pub fn finalize(self) -> Checksum {
        hex::encode(self.inner.finalize())
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a byte slice in one shot.
pub fn sha256_hex(data: &[u8]) -> Checksum {
    let mut hasher = Sha256Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Hash the contents of a file, streaming so large preludes don't need to
/// be buffered in memory.
pub fn sha256_file(path: impl AsRef<Path>) -> Result<Checksum, CryptoError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sha256_hex_known_vector() {
        // sha256("abc")
        let hash = sha256_hex(b"abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic() {
        let h1 = sha256_hex(b"test");
        let h2 = sha256_hex(b"test");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_inputs() {
        let h1 = sha256_hex(b"input1");
        let h2 = sha256_hex(b"input2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_streaming_matches_oneshot() {
        let oneshot = sha256_hex(b"hello world");

        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let streaming = hasher.finalize();

        assert_eq!(oneshot, streaming);
    }

    #[test]
    fn test_sha256_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"module.pact contents").unwrap();
        tmp.flush().unwrap();

        let file_hash = sha256_file(tmp.path()).unwrap();
        let memory_hash = sha256_hex(b"module.pact contents");
        assert_eq!(file_hash, memory_hash);
    }

    #[test]
    fn test_sha256_file_missing() {
        let result = sha256_file("/nonexistent/path/does-not-exist.pact");
        assert!(result.is_err());
    }
}
