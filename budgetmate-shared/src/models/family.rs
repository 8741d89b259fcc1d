/// Family model and database operations
///
/// A family is the tenant boundary: users, transactions, budgets, goals,
/// subscriptions and purchase requests all carry a `family_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE subscription_tier AS ENUM ('free', 'premium');
///
/// CREATE TABLE families (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     subscription_tier subscription_tier NOT NULL DEFAULT 'free',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Billing tier of a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
        }
    }
}

/// A household sharing one set of books
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Family {
    pub id: i64,
    pub name: String,
    pub subscription_tier: SubscriptionTier,
    pub created_at: DateTime<Utc>,
}

impl Family {
    /// Inserts a family on the free tier.
    ///
    /// Takes any executor so signup can create the family and its first
    /// user inside one database transaction.
    pub async fn create<'e, E>(executor: E, name: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Family>(
            r#"
            INSERT INTO families (name)
            VALUES ($1)
            RETURNING id, name, subscription_tier, created_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            "SELECT id, name, subscription_tier, created_at FROM families WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Number of users in the family; this is the electorate for purchase
    /// request votes.
    pub async fn member_count(pool: &PgPool, family_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE family_id = $1")
            .bind(family_id)
            .fetch_one(pool)
            .await
    }

    /// Deletes the family and, via cascades, everything scoped to it.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM families WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
