//! Scoped ownership of a prover session.

use std::sync::Arc;

use tracing::{info, warn};

use prover_client::{Session, SessionError, SessionManager};

/// A held prover session, released exactly once.
///
/// [`SessionLease::release`] consumes the lease. A lease dropped without an
/// explicit release spawns the release on the current tokio runtime, or logs
/// the leak when there is none.
pub struct SessionLease {
    session: Option<Session>,
    manager: Arc<dyn SessionManager>,
}

impl SessionLease {
    pub async fn acquire(manager: Arc<dyn SessionManager>) -> Result<Self, SessionError> {
        let session = manager.acquire().await?;
        info!("Acquired prover session {} at {}", session.id, session.endpoint);
        Ok(Self {
            session: Some(session),
            manager,
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Best-effort release. Failures are logged, never returned.
    pub async fn release(mut self) -> bool {
        match self.session.take() {
            Some(session) => release_session(self.manager.as_ref(), &session).await,
            None => false,
        }
    }
}

async fn release_session(manager: &dyn SessionManager, session: &Session) -> bool {
    match manager.release(session).await {
        Ok(()) => {
            info!("Released prover session {}", session.id);
            true
        }
        Err(err) => {
            warn!("Failed to release prover session {}: {}", session.id, err);
            false
        }
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let manager = Arc::clone(&self.manager);
                handle.spawn(async move {
                    release_session(manager.as_ref(), &session).await;
                });
            }
            Err(_) => warn!(
                "Prover session {} dropped outside a runtime; it will be reaped by the server",
                session.id
            ),
        }
    }
}

impl std::fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLease")
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prover_client::MockSessionManager;

    #[tokio::test]
    async fn test_explicit_release_happens_once() {
        let manager = MockSessionManager::new();
        let lease = SessionLease::acquire(Arc::new(manager.clone())).await.unwrap();
        let id = lease.session().map(|session| session.id.clone());

        assert!(lease.release().await);
        tokio::task::yield_now().await;

        assert_eq!(manager.released().len(), 1);
        assert_eq!(manager.released().first().cloned(), id);
    }

    #[tokio::test]
    async fn test_drop_releases() {
        let manager = MockSessionManager::new();
        let lease = SessionLease::acquire(Arc::new(manager.clone())).await.unwrap();

        drop(lease);
        tokio::task::yield_now().await;

        assert_eq!(manager.released().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_release_is_not_escalated() {
        let manager = MockSessionManager::new();
        manager.fail_release("connection reset");
        let lease = SessionLease::acquire(Arc::new(manager.clone())).await.unwrap();

        assert!(!lease.release().await);
        assert_eq!(manager.released().len(), 1);
    }
}
