//! Composition-root configuration: everything the binary needs that isn't
//! part of the mining trigger's own config record.

use mining_trigger::MiningTriggerConfig;
use prelude_cache::{Prelude, PreludeSpec, PreludeSpecs};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable naming the config file path. Falls back to
/// `./devnet.json` when unset. There is no CLI here - the core has none -
/// but a process still needs *some* way to receive its settings.
pub const CONFIG_PATH_ENV: &str = "PACT_DEVNET_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./devnet.json";

/// Top-level devnet process configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevnetConfig {
    pub bind_addr: SocketAddr,
    pub mining_trigger: MiningTriggerConfig,
    pub preludes_dir: PathBuf,
    #[serde(default)]
    pub preludes: Vec<PreludeDecl>,
}

/// A prelude as declared in the config file; converted into
/// [`prelude_cache::Prelude`] before being handed to the resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreludeDecl {
    pub name: String,
    pub specs: Vec<PreludeSpec>,
}

impl From<PreludeDecl> for Prelude {
    fn from(decl: PreludeDecl) -> Self {
        Prelude {
            name: decl.name,
            specs: PreludeSpecs::Flat(decl.specs),
        }
    }
}

impl DevnetConfig {
    /// Load from `PACT_DEVNET_CONFIG`, or `./devnet.json` if unset.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read devnet config at '{path}': {e}"))?;
        let config: DevnetConfig = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse devnet config at '{path}': {e}"))?;
        config.mining_trigger.validate()?;
        Ok(config)
    }
}
