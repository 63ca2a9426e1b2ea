//! Access-token claims shared by the identity and blog services
//!
//! Tokens are HS256 JWTs signed with a secret known to both services. The
//! identity service issues them; every other service only verifies them.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Server-side session the token belongs to
    pub sid: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Errors raised while configuring or checking tokens
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("JWT_SECRET environment variable not set")]
    MissingSecret,

    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret
    pub secret: String,
    /// Access token expiration time in seconds (default: 1 hour)
    pub access_token_expiry: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC secret used to sign and verify tokens (required)
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 3600)
    pub fn from_env() -> Result<Self, TokenError> {
        let secret = env::var("JWT_SECRET").map_err(|_| TokenError::MissingSecret)?;
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let access_token_expiry = env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        Ok(Self {
            secret,
            access_token_expiry,
        })
    }
}

/// Verifies access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serial_test::serial;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(secret: &str, exp: u64) -> (Claims, String) {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "editor@example.com".to_string(),
            sid: Uuid::new_v4(),
            iat: now(),
            exp,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (claims, token)
    }

    fn config(secret: &str) -> TokenConfig {
        TokenConfig {
            secret: secret.to_string(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let (claims, token) = sign("s3cret", now() + 60);
        let verified = TokenVerifier::new(&config("s3cret")).verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_verify_rejects_wrong_secret_and_expired() {
        let (_, token) = sign("other", now() + 60);
        assert!(TokenVerifier::new(&config("s3cret")).verify(&token).is_err());

        let (_, expired) = sign("s3cret", now() - 120);
        assert!(TokenVerifier::new(&config("s3cret")).verify(&expired).is_err());
    }

    #[test]
    #[serial]
    fn test_token_config_requires_secret() {
        unsafe {
            env::remove_var("JWT_SECRET");
        }
        assert!(matches!(
            TokenConfig::from_env(),
            Err(TokenError::MissingSecret)
        ));

        unsafe {
            env::set_var("JWT_SECRET", "abc");
        }
        let config = TokenConfig::from_env().unwrap();
        assert_eq!(config.access_token_expiry, 3600);

        unsafe {
            env::remove_var("JWT_SECRET");
        }
    }
}
