//! In-process identity provider
//!
//! Used as a test double for the guard and login flows. Session queries can
//! be paused or made to fail, and every query is counted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::identity::{
    AuthEvent, IdentityError, IdentityProvider, Session, SessionBroadcaster, Subscription,
};

struct Account {
    user_id: String,
    password: String,
}

pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    events: SessionBroadcaster,
    paused: watch::Sender<bool>,
    failing: AtomicBool,
    queries_started: AtomicUsize,
    queries_completed: AtomicUsize,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            events: SessionBroadcaster::default(),
            paused,
            failing: AtomicBool::new(false),
            queries_started: AtomicUsize::new(0),
            queries_completed: AtomicUsize::new(0),
        }
    }

    /// Register an account that `sign_in_with_password` will accept
    pub async fn add_account(&self, email: &str, password: &str, user_id: &str) {
        self.accounts.write().await.insert(
            email.to_string(),
            Account {
                user_id: user_id.to_string(),
                password: password.to_string(),
            },
        );
    }

    /// Install a session without emitting an event, as if restored from storage
    pub async fn restore_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    /// Drop the session silently; only a re-query notices
    pub async fn expire_session(&self) {
        *self.session.write().await = None;
    }

    /// Rotate the access token of the current session and announce it
    pub async fn refresh_token(&self) {
        let refreshed = {
            let mut session = self.session.write().await;
            if let Some(current) = session.as_mut() {
                current.access_token = Uuid::new_v4().to_string();
            }
            session.clone()
        };
        if refreshed.is_some() {
            self.events.publish(AuthEvent::TokenRefreshed, refreshed);
        }
    }

    /// Hold every `get_session` call until [`Self::resume_session_queries`]
    pub fn pause_session_queries(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume_session_queries(&self) {
        self.paused.send_replace(false);
    }

    /// Make `get_session` fail with a transport error
    pub fn fail_session_queries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn session_queries_started(&self) -> usize {
        self.queries_started.load(Ordering::SeqCst)
    }

    pub fn session_queries_completed(&self) -> usize {
        self.queries_completed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        self.queries_started.fetch_add(1, Ordering::SeqCst);

        let mut paused = self.paused.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = paused.wait_for(|paused| !*paused).await;

        let result = if self.failing.load(Ordering::SeqCst) {
            Err(IdentityError::Transport("connection refused".to_string()))
        } else {
            Ok(self.session.read().await.clone())
        };

        self.queries_completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn on_session_change(&self) -> Subscription {
        self.events.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let user_id = {
            let accounts = self.accounts.read().await;
            match accounts.get(email) {
                Some(account) if account.password == password => account.user_id.clone(),
                _ => {
                    return Err(IdentityError::InvalidCredentials(
                        "Invalid login credentials".to_string(),
                    ));
                }
            }
        };

        let session = Session {
            user_id,
            email: email.to_string(),
            access_token: Uuid::new_v4().to_string(),
            expires_at: None,
        };
        *self.session.write().await = Some(session.clone());
        self.events
            .publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *self.session.write().await = None;
        self.events.publish(AuthEvent::SignedOut, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Notification;

    #[tokio::test]
    async fn test_sign_in_and_out_emit_events() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_account("admin@site.io", "pw", "u-1").await;
        let mut subscription = provider.on_session_change();

        let session = provider
            .sign_in_with_password("admin@site.io", "pw")
            .await
            .unwrap();
        assert_eq!(session.user_id, "u-1");
        assert!(matches!(
            subscription.recv().await,
            Notification::Changed(change) if change.event == AuthEvent::SignedIn
        ));

        provider.sign_out().await.unwrap();
        assert!(matches!(
            subscription.recv().await,
            Notification::Changed(change) if change.session.is_none()
        ));
        assert_eq!(provider.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_account("admin@site.io", "pw", "u-1").await;

        let err = provider
            .sign_in_with_password("admin@site.io", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_failing_queries() {
        let provider = InMemoryIdentityProvider::new();
        provider.fail_session_queries(true);
        assert!(provider.get_session().await.is_err());
        assert_eq!(provider.session_queries_completed(), 1);
    }
}
