//! # Prelude Cache
//!
//! Resolves named bundles of Pact source files ("preludes") sourced from Git
//! repositories, deduplicates repository clones across specs, materialises
//! files into the layout a devnet runtime expects, and maintains a
//! persistent, checksum-validated on-disk cache.
//!
//! This crate does no dependency resolution and has no semver semantics -
//! it is a content-addressed fetch-and-cache engine, not a package manager.

#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod resolver;
pub mod spec;

pub use cache::{CacheAgeInfo, CacheEntry, CacheStats, CacheStore, CachedSpec, PreludeCacheFile, CACHE_VERSION};
pub use error::Error;
pub use fetcher::{Git2Fetcher, GitArchiveFetcher};
pub use resolver::PreludeResolver;
pub use spec::{ParsedUri, Prelude, PreludeSpec, PreludeSpecs};
