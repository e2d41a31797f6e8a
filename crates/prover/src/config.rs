//! Prover connection configuration.

use std::env;
use std::time::Duration;

/// Errors raised while loading or validating [`ProverConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid session manager URL: {0}")]
    InvalidUrl(String),

    #[error("Prover host must not be empty")]
    EmptyHost,

    #[error("Request timeout must be greater than 0")]
    ZeroTimeout,
}

/// Where the session manager lives and how to talk to the instances it spawns.
#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Base URL of the session manager
    pub session_url: String,

    /// Host the per-session prover instances listen on
    pub prover_host: String,

    /// Timeout for session calls, probes and artifact fetches.
    /// Proof uploads are not bounded by it.
    pub request_timeout: Duration,
}

impl ProverConfig {
    pub fn new(session_url: impl Into<String>) -> Self {
        Self {
            session_url: session_url.into(),
            prover_host: "localhost".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `default_session_url` is used when `PROVER_SESSION_URL` is unset,
    /// typically the prover deployed alongside the selected network.
    ///
    /// Environment variables:
    /// - `PROVER_SESSION_URL` - Session manager URL
    /// - `PROVER_HOST` - Host of the per-session instances (default: localhost)
    /// - `HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
    pub fn from_env(default_session_url: &str) -> Result<Self, ConfigError> {
        let session_url =
            env::var("PROVER_SESSION_URL").unwrap_or_else(|_| default_session_url.to_string());
        let mut config = Self::new(session_url);

        if let Ok(host) = env::var("PROVER_HOST") {
            config.prover_host = host;
        }

        if let Ok(value) = env::var("HTTP_TIMEOUT_SECS") {
            let secs = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECS",
                value,
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_prover_host(mut self, host: impl Into<String>) -> Self {
        self.prover_host = host.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Session manager URL without trailing slash.
    pub fn get_session_url(&self) -> &str {
        self.session_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.get_session_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }

        if self.prover_host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ProverConfig::default();
        assert_eq!(config.get_session_url(), "http://localhost:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ProverConfig::new("localhost:8080").validate(),
            Err(ConfigError::InvalidUrl(url)) if url == "localhost:8080"
        ));
        assert!(matches!(
            ProverConfig::default().with_prover_host("").validate(),
            Err(ConfigError::EmptyHost)
        ));
        assert!(matches!(
            ProverConfig::default()
                .with_request_timeout(Duration::ZERO)
                .validate(),
            Err(ConfigError::ZeroTimeout)
        ));
    }
}
