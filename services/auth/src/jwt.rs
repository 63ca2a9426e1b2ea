//! JWT service for access token issuance and validation
//!
//! Tokens are signed with the HS256 secret shared with the blog service, which
//! verifies them with [`TokenVerifier`]. Each token names the server-side
//! session it belongs to in its `sid` claim.

use anyhow::Result;
use common::token::{Claims, TokenConfig, TokenVerifier};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Session, User};

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    config: TokenConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            verifier: TokenVerifier::new(&config),
            config,
        }
    }

    /// Generate an access token for a user's session
    pub fn generate_access_token(&self, user: &User, session: &Session) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            sid: session.id,
            iat: now,
            exp: now.saturating_add(self.config.access_token_expiry),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        Ok(self.verifier.verify(token)?)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }
}
