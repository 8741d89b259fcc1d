/// Family invite links
///
/// An invite is a random code that lets its holder move into the family.
/// Codes expire after a week and are not consumed on use; sharing a link
/// with several people is allowed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invites (
///     code VARCHAR(64) PRIMARY KEY,
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     created_by BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// How long an invite link stays valid
pub const INVITE_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invite {
    pub code: String,
    pub family_id: i64,
    pub created_by: i64,
    pub expires_at: DateTime<Utc>,
}

/// An invite joined with the name of the family it opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvitePreview {
    pub code: String,
    pub family_id: i64,
    pub family_name: String,
    pub expires_at: DateTime<Utc>,
}

impl Invite {
    pub async fn create(
        pool: &PgPool,
        code: &str,
        family_id: i64,
        created_by: i64,
    ) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + Duration::days(INVITE_TTL_DAYS);

        sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO invites (code, family_id, created_by, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING code, family_id, created_by, expires_at
            "#,
        )
        .bind(code)
        .bind(family_id)
        .bind(created_by)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Looks up an unexpired invite.
    pub async fn find_valid(pool: &PgPool, code: &str) -> Result<Option<InvitePreview>, sqlx::Error> {
        sqlx::query_as::<_, InvitePreview>(
            r#"
            SELECT i.code, i.family_id, f.name AS family_name, i.expires_at
            FROM invites i
            JOIN families f ON f.id = i.family_id
            WHERE i.code = $1 AND i.expires_at > NOW()
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }
}
