//! # Mining Trigger
//!
//! Drives a devnet's mining client on behalf of whatever is submitting
//! transactions against it: a transaction proxy schedules confirmations for
//! every accepted send, a confirmation worker turns scheduled demand into
//! `make-blocks` bursts, and an idle worker keeps the chain moving when
//! nothing is happening.
//!
//! The mining trigger owns no HTTP listener of its own - `Orchestrator::start`
//! takes an [`axum::Router`] built elsewhere and merges its proxy route onto
//! it, so it can share a port with anything else the host process serves.

#![warn(clippy::all)]

pub mod activity;
pub mod block_requester;
pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod proxy;
pub mod scheduler;
pub mod workers;

pub use activity::{ActivityResult, ActivitySignal};
pub use block_requester::{BlockRequester, HttpBlockRequester};
pub use chain::{ChainId, ChainIdError, CHAIN_COUNT};
pub use config::MiningTriggerConfig;
pub use error::Error;
pub use events::{BlockRequestReason, MtEvent};
pub use orchestrator::Orchestrator;
pub use scheduler::{ConfirmationDemand, ConfirmationScheduler};
