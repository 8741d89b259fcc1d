/// Session rows
///
/// The browser holds the plaintext token in the `session_token` cookie; the
/// table only ever sees its SHA-256 (see `auth::token::hash_token`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     token_hash VARCHAR(64) PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::user::{User, UserRole};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The slice of a user that authenticated handlers need. This is what the
/// session cache stores and what the auth middleware hands to handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionUser {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub family_id: i64,
    pub role: UserRole,
}

/// An unexpired session joined with its user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiveSession {
    #[sqlx(flatten)]
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub async fn create(
        pool: &PgPool,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token_hash, user_id, expires_at, created_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Resolves an unexpired session to its user.
    pub async fn find_live(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<LiveSession>, sqlx::Error> {
        sqlx::query_as::<_, LiveSession>(
            r#"
            SELECT s.expires_at, u.id AS user_id, u.email, u.name, u.avatar_url,
                   u.family_id, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every session of `user_id` except the one identified by
    /// `keep_token_hash`. Returns how many were revoked.
    pub async fn delete_others(
        pool: &PgPool,
        user_id: i64,
        keep_token_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token_hash <> $2")
            .bind(user_id)
            .bind(keep_token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            family_id: user.family_id,
            role: user.role,
        }
    }
}
