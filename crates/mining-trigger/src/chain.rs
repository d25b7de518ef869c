//! Chain identifiers.
//!
//! The devnet topology is fixed at twenty chains (0..20). A `ChainId` is a
//! small validated wrapper rather than a bare `u8` so a badly parsed path
//! segment can't silently address chain 255.

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of chains in the devnet topology.
pub const CHAIN_COUNT: u8 = 20;

/// A validated chain identifier in `0..CHAIN_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u8);

/// Errors parsing or constructing a [`ChainId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainIdError {
    /// The value is not a valid unsigned integer.
    #[error("'{0}' is not a valid chain id")]
    NotAnInteger(String),
    /// The value is out of the `0..CHAIN_COUNT` range.
    #[error("chain id {0} is out of range (must be < {CHAIN_COUNT})")]
    OutOfRange(u16),
}

impl ChainId {
    /// Construct a `ChainId`, rejecting anything outside `0..CHAIN_COUNT`.
    pub fn new(value: u8) -> Result<Self, ChainIdError> {
        if value >= CHAIN_COUNT {
            return Err(ChainIdError::OutOfRange(value as u16));
        }
        Ok(Self(value))
    }

    /// The underlying chain number.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Every chain in the topology, in ascending order.
    #[must_use]
    pub fn all() -> Vec<ChainId> {
        (0..CHAIN_COUNT).map(ChainId).collect()
    }

    /// A uniformly random chain, used by the idle worker to pick a target.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::thread_rng().gen_range(0..CHAIN_COUNT))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = ChainIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u16 = s
            .parse()
            .map_err(|_| ChainIdError::NotAnInteger(s.to_string()))?;
        let value: u8 = value
            .try_into()
            .map_err(|_| ChainIdError::OutOfRange(value))?;
        ChainId::new(value)
    }
}

impl Serialize for ChainId {
    // Serialized as a decimal string: the block requester posts
    // `{"<chainId>": count}` bodies where the chain id is a JSON object key.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}
