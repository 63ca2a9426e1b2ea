//! Identity provider backed by the auth service over HTTP

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::env;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::identity::{
    AuthEvent, IdentityError, IdentityProvider, Session, SessionBroadcaster, Subscription,
};

/// Location of the auth service
#[derive(Debug, Clone)]
pub struct HttpIdentityConfig {
    pub base_url: String,
}

impl HttpIdentityConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            env::var("IDENTITY_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        Self::new(base_url)
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: UserBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            IdentityError::Unexpected(e.to_string())
        } else {
            IdentityError::Transport(e.to_string())
        }
    }
}

/// Client of `/auth/token`, `/auth/user` and `/auth/logout`
///
/// The session obtained by signing in is held in memory only.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    config: HttpIdentityConfig,
    session: RwLock<Option<Session>>,
    events: SessionBroadcaster,
}

impl HttpIdentityProvider {
    pub fn new(config: HttpIdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            session: RwLock::new(None),
            events: SessionBroadcaster::default(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("status {}", status),
        }
    }

    /// Forget the held session and tell subscribers
    async fn drop_session(&self) {
        let had_session = self.session.write().await.take().is_some();
        if had_session {
            self.events.publish(AuthEvent::SignedOut, None);
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        let Some(current) = self.session.read().await.clone() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.url("/auth/user"))
            .bearer_auth(&current.access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let user: UserBody = response.json().await?;
                Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                    ..current
                }))
            }
            StatusCode::UNAUTHORIZED => {
                info!("Access token no longer accepted, dropping session");
                self.drop_session().await;
                Ok(None)
            }
            _ => Err(IdentityError::Unexpected(
                Self::error_message(response).await,
            )),
        }
    }

    fn on_session_change(&self) -> Subscription {
        self.events.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response = self
            .client
            .post(self.url("/auth/token"))
            .json(&TokenRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::InvalidCredentials(
                Self::error_message(response).await,
            ));
        }
        if !status.is_success() {
            return Err(IdentityError::Unexpected(
                Self::error_message(response).await,
            ));
        }

        let token: TokenResponse = response.json().await?;
        let session = Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
            expires_at: Duration::try_seconds(token.expires_in)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl)),
        };

        *self.session.write().await = Some(session.clone());
        self.events
            .publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone());

        if let Some(token) = token {
            // The local session is dropped even when the service cannot be told.
            match self
                .client
                .post(self.url("/auth/logout"))
                .bearer_auth(token)
                .send()
                .await
            {
                Ok(response) if !response.status().is_success() => {
                    warn!("Logout answered with status {}", response.status());
                }
                Ok(_) => {}
                Err(e) => warn!("Logout request failed: {}", e),
            }
        }

        *self.session.write().await = None;
        self.events.publish(AuthEvent::SignedOut, None);
        Ok(())
    }
}
