//! Application state shared across handlers

use common::token::TokenVerifier;
use sqlx::SqlitePool;

use crate::{config::ApiConfig, identity::IdentityClient, repositories::BlogRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub blogs: BlogRepository,
    pub verifier: TokenVerifier,
    pub identity: IdentityClient,
}

impl AppState {
    /// Build the state, creating and seeding the blogs table
    pub async fn init(pool: SqlitePool, config: &ApiConfig) -> anyhow::Result<Self> {
        let blogs = BlogRepository::new(pool);
        blogs.migrate().await?;
        blogs.seed_if_empty().await?;

        Ok(Self {
            blogs,
            verifier: TokenVerifier::new(&config.token),
            identity: IdentityClient::new(config.identity_url.clone()),
        })
    }
}
