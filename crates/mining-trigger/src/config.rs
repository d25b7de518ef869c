//! Mining trigger configuration.

use crate::error::Error;
use serde::Deserialize;
use url::Url;

/// Configuration for one mining trigger instance.
///
/// Deserialized from the composition root's config file; `validate()` must
/// be called before the config is handed to [`crate::orchestrator::Orchestrator`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MiningTriggerConfig {
    /// Base URL of the mining client's `make-blocks` endpoint host.
    pub mining_client_url: Url,
    /// Base URL of the Chainweb service API the transaction proxy forwards to.
    pub chainweb_service_endpoint: Url,
    /// How often, absent activity, the idle worker requests a keepalive block.
    pub idle_trigger_period_sec: f64,
    /// How often the confirmation scheduler is polled for pending demand.
    pub confirmation_trigger_period_sec: f64,
    /// Batching window: confirmations requested for the same chain within
    /// this window are coalesced into one demand.
    #[serde(default = "default_transaction_batch_period_sec")]
    pub transaction_batch_period_sec: f64,
    /// Delay between successive `make-blocks` calls within one confirmation
    /// burst, to avoid hammering the mining client.
    #[serde(default)]
    pub mining_cooldown_sec: f64,
    /// Number of confirmations requested per accepted transaction.
    pub default_confirmation_count: u32,
    /// Disables the idle worker entirely (e.g. for tests).
    #[serde(default)]
    pub disable_idle_worker: bool,
    /// Disables the confirmation worker entirely (e.g. for tests).
    #[serde(default)]
    pub disable_confirmation_worker: bool,
}

fn default_transaction_batch_period_sec() -> f64 {
    0.05
}

impl MiningTriggerConfig {
    /// Validate the configuration, rejecting values that would make the
    /// workers busy-loop or never run.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.idle_trigger_period_sec > 0.0) {
            return Err(Error::ConfigInvalid(
                "idle_trigger_period_sec must be greater than zero".into(),
            ));
        }
        if !(self.confirmation_trigger_period_sec > 0.0) {
            return Err(Error::ConfigInvalid(
                "confirmation_trigger_period_sec must be greater than zero".into(),
            ));
        }
        if self.transaction_batch_period_sec < 0.0 {
            return Err(Error::ConfigInvalid(
                "transaction_batch_period_sec must not be negative".into(),
            ));
        }
        if self.mining_cooldown_sec < 0.0 {
            return Err(Error::ConfigInvalid(
                "mining_cooldown_sec must not be negative".into(),
            ));
        }
        Ok(())
    }
}
