//! Session manager client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use super::error_text;
use crate::config::ProverConfig;
use crate::traits::{SessionError, SessionManager};
use crate::types::{ProverEndpoint, Session, SessionId};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
    prover_port: u16,
}

/// Session manager reached over HTTP.
pub struct HttpSessionManager {
    config: ProverConfig,
    http_client: reqwest::Client,
}

impl HttpSessionManager {
    pub fn new(config: ProverConfig) -> Result<Self, SessionError> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionError::Network(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.get_session_url(), path)
    }
}

#[async_trait]
impl SessionManager for HttpSessionManager {
    async fn acquire(&self) -> Result<Session, SessionError> {
        let url = self.url("/session");
        debug!("Requesting prover session from {}", url);

        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| SessionError::Unavailable(format!("session manager unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Unavailable(format!(
                "session request failed with status {}: {}",
                status,
                error_text(response).await
            )));
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Unavailable(format!("malformed session response: {}", e)))?;

        let session = Session {
            id: SessionId::new(body.session_id),
            endpoint: ProverEndpoint::from_host_port(&self.config.prover_host, body.prover_port),
        };

        info!("✓ Prover session {} at {}", session.id, session.endpoint);
        Ok(session)
    }

    async fn release(&self, session: &Session) -> Result<(), SessionError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/session/{}", session.id)))
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SessionError::NotFound(session.id.clone())),
            status if status.is_success() => {
                info!("✓ Prover session {} released", session.id);
                Ok(())
            }
            status => Err(SessionError::Network(format!(
                "session release failed with status {}: {}",
                status,
                error_text(response).await
            ))),
        }
    }

    async fn heartbeat(&self, session: &Session) -> Result<(), SessionError> {
        let response = self
            .http_client
            .post(self.url(&format!("/session/{}/heartbeat", session.id)))
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SessionError::NotFound(session.id.clone())),
            status if status.is_success() => {
                debug!("Heartbeat sent for session {}", session.id);
                Ok(())
            }
            status => Err(SessionError::Network(format!(
                "heartbeat failed with status {}",
                status
            ))),
        }
    }
}
