//! # Shared Crypto - Content Hashing
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Prelude cache content addressing |
//!
//! SHA-256 was kept deliberately boring: checksums land in `.cache.json`
//! and get compared across machines and Pact toolchain versions, so the
//! priority is a ubiquitous digest everyone can recompute, not throughput.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;

pub use errors::CryptoError;
pub use hashing::{sha256_file, sha256_hex, Checksum, Sha256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
