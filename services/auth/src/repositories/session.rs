//! Session repository
//!
//! A session row exists for every live access token. Signing out deletes the
//! row, which invalidates the token even before it expires.

use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::models::Session;

/// Longest lifetime a session row can be given (ten years)
const MAX_SESSION_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the sessions table if it does not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id BLOB PRIMARY KEY,
                user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Open a session for `user_id` lasting `ttl_seconds`
    pub async fn create(&self, user_id: Uuid, ttl_seconds: u64) -> Result<Session> {
        let now = Utc::now();
        let ttl = i64::try_from(ttl_seconds)
            .unwrap_or(i64::MAX)
            .min(MAX_SESSION_TTL_SECONDS);
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            expires_at: now + Duration::seconds(ttl),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        info!("Opened session {} for user {}", session.id, user_id);
        Ok(session)
    }

    /// Live session by id; an expired row is removed and reported as absent
    pub async fn find_active(&self, id: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM sessions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let session = Session {
            id: row.get("id"),
            user_id: row.get("user_id"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        };

        if session.is_expired() {
            self.delete(session.id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Close a session; closing an unknown session is not an error
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!("Closed session {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::UserRepository;
    use common::database::{DatabaseConfig, init_pool};

    async fn setup() -> (Uuid, SessionRepository) {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        let users = UserRepository::new(pool.clone());
        users.migrate().await.unwrap();
        let sessions = SessionRepository::new(pool);
        sessions.migrate().await.unwrap();

        let user = users
            .create(&NewUser {
                email: "admin@site.io".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        (user.id, sessions)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (user_id, sessions) = setup().await;
        let session = sessions.create(user_id, 3600).await.unwrap();

        let found = sessions.find_active(session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);

        sessions.delete(session.id).await.unwrap();
        assert!(sessions.find_active(session.id).await.unwrap().is_none());
        // Deleting twice is fine.
        sessions.delete(session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_capped() {
        let (user_id, sessions) = setup().await;
        let session = sessions.create(user_id, u64::MAX).await.unwrap();

        let lifetime = session.expires_at - session.created_at;
        assert_eq!(lifetime.num_seconds(), MAX_SESSION_TTL_SECONDS);
        assert!(sessions.find_active(session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let (user_id, sessions) = setup().await;
        let session = sessions.create(user_id, 0).await.unwrap();
        assert!(sessions.find_active(session.id).await.unwrap().is_none());
    }
}
