//! Service configuration read from the environment

use anyhow::Result;
use common::token::TokenConfig;
use std::env;

/// Blog service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address (default: 0.0.0.0:3001)
    pub bind_addr: String,
    pub token: TokenConfig,
    /// Identity service that vouches for bearer tokens
    pub identity_url: String,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_BIND_ADDR`: listen address (default: "0.0.0.0:3001")
    /// - `JWT_SECRET`, `JWT_ACCESS_TOKEN_EXPIRY`: see [`TokenConfig::from_env`]
    /// - `IDENTITY_URL`: identity service base URL (default: "http://localhost:3000")
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string()),
            token: TokenConfig::from_env()?,
            identity_url: env::var("IDENTITY_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}
