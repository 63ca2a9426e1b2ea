//! Blog service
//!
//! Public reads of blog posts and token-gated publishing, backed by SQLite
//! and seeded with the site's launch posts. Publishing tokens are confirmed
//! with the identity service.

pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;
