//! Common library for the site services
//!
//! This crate provides shared functionality used across the services and the
//! admin console core: SQLite connectivity, the generic row store, error
//! types and access-token verification.

pub mod database;
pub mod error;
pub mod store;
pub mod token;

pub use error::{DatabaseError, StoreError, StoreResult};
pub use store::{Filter, MemoryRowStore, Row, RowStore, SqliteRowStore};

/// Example usage of the database and row-store modules
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, init_pool, health_check};
/// use common::{Filter, RowStore, SqliteRowStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     println!("Database health check: {}", health_check(&pool).await?);
///
///     let store = SqliteRowStore::new(pool);
///     store.migrate().await?;
///     let profiles = store.select("profiles", &Filter::all()).await?;
///     println!("{} profiles", profiles.len());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
