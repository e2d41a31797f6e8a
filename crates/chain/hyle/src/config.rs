//! Hyle network configuration.

use std::env;
use std::time::Duration;

use chain_core::ChainConfig;

/// Errors raised while loading [`HyleConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HYLE_NETWORK: {0}. Must be localhost or devnet")]
    InvalidNetwork(String),

    #[error("Invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Supported Hyle deployments.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HyleNetwork {
    /// Local node and prover
    #[default]
    Localhost,
    /// Public devnet
    Devnet,
}

impl HyleNetwork {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            HyleNetwork::Localhost => "http://localhost:1317",
            HyleNetwork::Devnet => "https://api.devnet.hyle.eu",
        }
    }

    /// Session manager of the SP1 prover deployed alongside this network.
    pub fn default_prover_url(&self) -> &'static str {
        match self {
            HyleNetwork::Localhost => "http://localhost:8080",
            HyleNetwork::Devnet => "https://vibe.hyle.eu/sp1prover",
        }
    }
}

/// Hyle-specific configuration.
#[derive(Debug, Clone)]
pub struct HyleConfig {
    /// Network to connect to
    pub network: HyleNetwork,

    /// Custom REST API URL (overrides network default)
    pub api_url: Option<String>,

    /// Timeout applied to every node request
    pub request_timeout: Duration,
}

impl HyleConfig {
    pub fn new(network: HyleNetwork) -> Self {
        Self {
            network,
            api_url: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HYLE_NETWORK` - Network name (localhost, devnet) (default: localhost)
    /// - `HYLE_API_URL` - Custom REST API URL
    /// - `HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = match env::var("HYLE_NETWORK") {
            Ok(value) => value
                .parse::<HyleNetwork>()
                .map_err(|_| ConfigError::InvalidNetwork(value))?,
            Err(_) => HyleNetwork::default(),
        };

        let mut config = Self::new(network);
        config.api_url = env::var("HYLE_API_URL").ok();

        if let Ok(value) = env::var("HTTP_TIMEOUT_SECS") {
            let secs = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECS",
                value,
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// REST API URL (custom or default for network), without trailing slash.
    pub fn get_api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_api_url())
            .trim_end_matches('/')
    }
}

impl ChainConfig for HyleConfig {
    fn network_name(&self) -> &str {
        match self.network {
            HyleNetwork::Localhost => "hyle-localhost",
            HyleNetwork::Devnet => "hyle-devnet",
        }
    }

    fn api_url(&self) -> &str {
        self.get_api_url()
    }

    fn validate(&self) -> Result<(), String> {
        let url = self.get_api_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("Invalid URL format: {}", url));
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for HyleConfig {
    fn default() -> Self {
        Self::new(HyleNetwork::Localhost)
    }
}
