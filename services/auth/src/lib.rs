//! Authentication service
//!
//! Password sign-in issuing HS256 access tokens bound to server-side
//! sessions, plus the endpoints the admin console's identity client uses.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod validation;

use anyhow::Result;
use common::token::TokenConfig;
use sqlx::SqlitePool;

use crate::{
    jwt::JwtService,
    repositories::{SessionRepository, UserRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub sessions: SessionRepository,
    pub jwt_service: JwtService,
}

impl AppState {
    /// Build the state and make sure its tables exist
    pub async fn init(pool: SqlitePool, token: TokenConfig) -> Result<Self> {
        let users = UserRepository::new(pool.clone());
        users.migrate().await?;
        let sessions = SessionRepository::new(pool);
        sessions.migrate().await?;

        Ok(Self {
            users,
            sessions,
            jwt_service: JwtService::new(token),
        })
    }
}
