//! Mining trigger error types.

use thiserror::Error;

/// Errors raised by the mining trigger's configuration, workers and proxy.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration failed [`crate::config::MiningTriggerConfig::validate`].
    #[error("invalid mining trigger configuration: {0}")]
    ConfigInvalid(String),

    /// A transport-level failure talking to the mining client or the
    /// downstream Chainweb service. Recoverable: workers log it, emit an
    /// `error` event and back off rather than terminating.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The orchestrator was asked to do something invalid given its current
    /// lifecycle state (e.g. `start()` twice).
    #[error("invalid orchestrator state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Whether a worker encountering this error should back off and retry
    /// rather than treat the orchestrator as dead. Only transport failures
    /// are recoverable; configuration and state errors mean the caller holds
    /// it wrong and must not be retried blindly.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
