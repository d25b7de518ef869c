//! # Shared Bus - Synchronous Event Fan-Out
//!
//! A small, typed, in-process event bus: `EventBus<E>` holds a list of
//! listener closures and calls each of them synchronously from `emit`.
//!
//! This is deliberately NOT the choreography-style async broadcast channel
//! used elsewhere for inter-subsystem messaging - the mining trigger has a
//! single process boundary and no replay/authentication concerns, so the
//! simplest thing that satisfies "typed event map, explicit fan-out,
//! non-blocking listeners by contract" is a direct function call list.

#![warn(clippy::all)]

pub mod bus;

pub use bus::{EventBus, SubscriptionId};
