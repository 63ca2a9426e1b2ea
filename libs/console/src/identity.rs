//! Identity provider interface
//!
//! The console never owns authentication state. It talks to an
//! [`IdentityProvider`] injected at construction time and listens to its
//! session changes through a [`Subscription`] handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// An authenticated principal as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session value always denotes a signed-in user; absence is `None`.
    pub fn is_authenticated(&self) -> bool {
        !self.user_id.is_empty()
    }
}

/// Kind of authentication state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// One session-change notification
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Errors reported by an identity provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    /// The provider refused the credentials
    #[error("{0}")]
    InvalidCredentials(String),

    /// The provider could not be reached
    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with something we do not understand
    #[error("Unexpected identity provider response: {0}")]
    Unexpected(String),
}

/// Capability set of the external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Subscribe to session changes; drop the handle to unsubscribe
    fn on_session_change(&self) -> Subscription;

    /// Exchange credentials for a session
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// What a [`Subscription`] yields
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A session change
    Changed(SessionChange),
    /// Some changes were dropped; the current session has to be re-queried
    Missed,
    /// The provider went away and no further changes will arrive
    Closed,
}

/// Disposable handle on a provider's session-change stream
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<SessionChange>,
}

impl Subscription {
    /// Wait for the next notification
    pub async fn recv(&mut self) -> Notification {
        match self.receiver.recv().await {
            Ok(change) => Notification::Changed(change),
            Err(broadcast::error::RecvError::Lagged(_)) => Notification::Missed,
            Err(broadcast::error::RecvError::Closed) => Notification::Closed,
        }
    }

    /// Release the subscription
    pub fn unsubscribe(self) {}
}

/// Fan-out of session changes used by provider implementations
#[derive(Debug, Clone)]
pub struct SessionBroadcaster {
    sender: broadcast::Sender<SessionChange>,
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new(16)
    }
}

impl SessionBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Deliver a change to every live subscription
    pub fn publish(&self, event: AuthEvent, session: Option<Session>) {
        // No subscribers is not an error.
        let _ = self.sender.send(SessionChange { event, session });
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
