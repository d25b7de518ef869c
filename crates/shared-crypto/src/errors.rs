//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The input could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}
