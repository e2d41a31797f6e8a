//! Client configuration assembled from the environment.

use anyhow::{Context, Result};

use chain_hyle::{HyleConfig, HyleNetwork};
use prover_client::ProverConfig;
use residency_runtime::RuntimeConfig;

/// Configuration of every layer the client wires together.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub hyle: HyleConfig,
    pub prover: ProverConfig,
    pub runtime: RuntimeConfig,
}

impl ClientConfig {
    /// Load all layers from the environment.
    ///
    /// `network` overrides `HYLE_NETWORK`. The prover session manager defaults
    /// to the one deployed alongside the selected network.
    pub fn from_env(network: Option<HyleNetwork>) -> Result<Self> {
        let mut hyle = HyleConfig::from_env().context("Failed to load Hyle configuration")?;
        if let Some(network) = network {
            hyle.network = network;
        }

        let prover = ProverConfig::from_env(hyle.network.default_prover_url())
            .context("Failed to load prover configuration")?;
        let runtime = RuntimeConfig::from_env().context("Failed to load runtime configuration")?;

        let config = Self {
            hyle,
            prover,
            runtime,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        use chain_core::ChainConfig;

        self.hyle
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid Hyle configuration: {}", e))?;
        self.prover
            .validate()
            .context("Invalid prover configuration")?;
        self.runtime
            .validate()
            .context("Invalid runtime configuration")?;
        Ok(())
    }
}
