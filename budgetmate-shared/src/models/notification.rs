/// In-app notifications
///
/// Notifications are written per recipient. Family-wide events insert one
/// row per member in a single `INSERT ... SELECT`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     type VARCHAR(32) NOT NULL,
///     message TEXT NOT NULL,
///     data TEXT NOT NULL DEFAULT '',
///     is_read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Notification `type` values
pub mod kind {
    /// Someone asked the family to approve a purchase
    pub const PURCHASE_REQUEST: &str = "purchase_request";
    /// A member voted on your request
    pub const VOTE: &str = "vote";
    /// A request was approved or rejected
    pub const REQUEST_STATUS: &str = "request_status";
    /// A member joined the family
    pub const MEMBER_JOINED: &str = "member_joined";
    /// Invitation to join another family; `data` is that family's id
    pub const INVITE: &str = "invite";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Opaque payload, usually the id of the related row
    pub data: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        kind: &str,
        message: &str,
        data: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, type, message, data)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, type, message, data, is_read, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .bind(data)
        .fetch_one(pool)
        .await
    }

    /// Notifies every member of `family_id`, skipping `except_user_id` when
    /// given. Returns the number of rows written.
    pub async fn notify_family(
        pool: &PgPool,
        family_id: i64,
        except_user_id: Option<i64>,
        kind: &str,
        message: &str,
        data: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, type, message, data)
            SELECT id, $3, $4, $5
            FROM users
            WHERE family_id = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            "#,
        )
        .bind(family_id)
        .bind(except_user_id)
        .bind(kind)
        .bind(message)
        .bind(data)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Looks up a notification addressed to `user_id`. Other users'
    /// notifications are reported as missing.
    pub async fn find_for_user(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, message, data, is_read, created_at
            FROM notifications
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Unread notifications, newest first.
    pub async fn unread_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, message, data, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Everything addressed to the user, read or not, newest first.
    pub async fn all_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, message, data, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn unread_count(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Marks one notification read. Returns `false` when it does not exist
    /// or belongs to someone else.
    pub async fn mark_read(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(pool: &PgPool, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
