//! Identity service client used to vet bearer tokens
//!
//! A token with a valid signature may still belong to a session that was
//! signed out, so publishing rights are confirmed with `GET /auth/user` on
//! every request.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    email: String,
}

/// Client of the identity service
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// User behind a live access token
    ///
    /// `None` when the identity service does not accept the token or cannot
    /// be reached.
    pub async fn current_user(&self, token: &str) -> Option<AuthUser> {
        let response = match self
            .client
            .get(format!("{}/auth/user", self.base_url))
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Identity service unreachable: {}", e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("Identity service refused token: {}", response.status());
            return None;
        }

        match response.json::<UserBody>().await {
            Ok(user) => Some(AuthUser {
                id: user.id,
                email: user.email,
            }),
            Err(e) => {
                warn!("Unreadable identity service response: {}", e);
                None
            }
        }
    }
}
