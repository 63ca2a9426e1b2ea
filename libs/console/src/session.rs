//! Session resolution against the identity provider

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::identity::{IdentityError, IdentityProvider, Session, Subscription};

/// Resolves the current session, failing closed
///
/// Keeps a transient copy of the last session it saw. The copy is a
/// convenience for display and is never consulted for access decisions.
#[derive(Clone)]
pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
    cache: Arc<RwLock<Option<Session>>>,
}

impl SessionResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Query the provider for the current session and remember it
    ///
    /// A provider error resolves to `None`.
    pub async fn get_session(&self) -> Option<Session> {
        let session = self.fetch().await;
        self.remember(session.clone()).await;
        session
    }

    /// Query the provider without touching the cached copy
    ///
    /// For callers that decide themselves whether the answer is still current.
    pub async fn fetch(&self) -> Option<Session> {
        match self.provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session query failed, treating as signed out: {}", e);
                None
            }
        }
    }

    /// Subscribe to the provider's session changes
    pub fn on_session_change(&self) -> Subscription {
        self.provider.on_session_change()
    }

    /// Last session seen by this resolver
    pub async fn cached(&self) -> Option<Session> {
        self.cache.read().await.clone()
    }

    /// Record a session delivered by a change notification
    pub async fn remember(&self, session: Option<Session>) {
        *self.cache.write().await = session;
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        info!("Signed in user {}", session.user_id);
        self.remember(Some(session.clone())).await;
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.remember(None).await;
        self.provider.sign_out().await?;
        info!("Signed out");
        Ok(())
    }
}
