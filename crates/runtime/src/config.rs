//! Orchestrator configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chain_core::{ContractName, Identity, VerifierKind};
use prover_client::ArtifactKind;

use crate::registry::ReadinessPolicy;
use crate::upload::UploadPolicy;

/// Errors raised while loading or validating [`RuntimeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Contract name must not be empty")]
    EmptyContractName,

    #[error("At least one content type must be accepted")]
    NoAcceptedTypes,

    #[error("{0} must be greater than 0")]
    Zero(&'static str),
}

/// Runtime configuration shared by the orchestrator and its components.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub contract_name: ContractName,
    pub verifier: VerifierKind,
    pub artifact: ArtifactKind,
    /// Identity blob transactions are sent for
    pub identity: Identity,
    pub readiness: ReadinessPolicy,
    pub upload: UploadPolicy,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            contract_name: ContractName::new("sp1_residency"),
            verifier: VerifierKind::Sp1,
            artifact: ArtifactKind::VerificationKey,
            identity: Identity::default(),
            readiness: ReadinessPolicy::default(),
            upload: UploadPolicy::default(),
            event_buffer_size: 64,
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RESIDENCY_CONTRACT` - Verifier contract name (default: sp1_residency)
    /// - `RESIDENCY_VERIFIER` - sp1, risc0 or noir (default: sp1)
    /// - `RESIDENCY_ARTIFACT` - verification_key or elf (default: verification_key)
    /// - `RESIDENCY_IDENTITY` - Identity for data transactions (default: default)
    /// - `READINESS_ATTEMPTS` - Prover readiness probes (default: 5)
    /// - `READINESS_INTERVAL_MS` - Delay between probes (default: 1000)
    /// - `MAX_FILE_SIZE` - Upload limit in bytes (default: 5000000)
    /// - `EVENT_BUFFER_SIZE` - Per-topic event buffer (default: 64)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(name) = env::var("RESIDENCY_CONTRACT") {
            config.contract_name = ContractName::new(name);
        }
        if let Some(verifier) = parse_var("RESIDENCY_VERIFIER")? {
            config.verifier = verifier;
        }
        if let Some(artifact) = parse_var("RESIDENCY_ARTIFACT")? {
            config.artifact = artifact;
        }
        if let Ok(identity) = env::var("RESIDENCY_IDENTITY") {
            config.identity = Identity::new(identity);
        }
        if let Some(attempts) = parse_var("READINESS_ATTEMPTS")? {
            config.readiness.attempts = attempts;
        }
        if let Some(millis) = parse_var::<u64>("READINESS_INTERVAL_MS")? {
            config.readiness.interval = Duration::from_millis(millis);
        }
        if let Some(size) = parse_var("MAX_FILE_SIZE")? {
            config.upload.max_file_size = size;
        }
        if let Some(size) = parse_var("EVENT_BUFFER_SIZE")? {
            config.event_buffer_size = size;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract_name = ContractName::new(name);
        self
    }

    pub fn with_readiness(mut self, attempts: u32, interval: Duration) -> Self {
        self.readiness = ReadinessPolicy { attempts, interval };
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.upload.max_file_size = max_file_size;
        self
    }

    pub fn with_accepted_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upload.accepted_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_name.as_str().is_empty() {
            return Err(ConfigError::EmptyContractName);
        }
        if self.readiness.attempts == 0 {
            return Err(ConfigError::Zero("Readiness attempts"));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::Zero("Max file size"));
        }
        if self.upload.accepted_types.is_empty() {
            return Err(ConfigError::NoAcceptedTypes);
        }
        if self.event_buffer_size == 0 {
            return Err(ConfigError::Zero("Event buffer size"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.contract_name.as_str(), "sp1_residency");
        assert_eq!(config.readiness.attempts, 5);
        assert_eq!(config.readiness.interval, Duration::from_secs(1));
        assert_eq!(config.upload.max_file_size, 5_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            RuntimeConfig::default()
                .with_readiness(0, Duration::from_secs(1))
                .validate(),
            Err(ConfigError::Zero("Readiness attempts"))
        ));
        assert!(matches!(
            RuntimeConfig::default()
                .with_accepted_types(Vec::<String>::new())
                .validate(),
            Err(ConfigError::NoAcceptedTypes)
        ));
        assert!(matches!(
            RuntimeConfig::default().with_contract_name("").validate(),
            Err(ConfigError::EmptyContractName)
        ));
    }
}
