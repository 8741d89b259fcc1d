/// Recurring subscriptions (streaming, gym, cloud storage, ...)
///
/// Due dates are not stored; `schedule::upcoming` derives them from
/// `billing_day` on every read.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscriptions (
///     id BIGSERIAL PRIMARY KEY,
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount > 0),
///     billing_day INTEGER NOT NULL CHECK (billing_day BETWEEN 1 AND 31),
///     category VARCHAR(100) NOT NULL DEFAULT 'Subscriptions',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX subscriptions_family_name_key ON subscriptions(family_id, LOWER(name));
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::FamilyScoped;

pub const DEFAULT_CATEGORY: &str = "Subscriptions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub family_id: i64,
    pub name: String,
    pub amount: f64,
    /// Day of month the charge lands, 1-31
    pub billing_day: i32,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub family_id: i64,
    pub name: String,
    pub amount: f64,
    pub billing_day: i32,
    pub category: Option<String>,
}

impl FamilyScoped for Subscription {
    fn family_id(&self) -> i64 {
        self.family_id
    }
}

impl Subscription {
    /// # Errors
    ///
    /// Fails with a unique violation on `subscriptions_family_name_key` when
    /// the family already tracks a subscription of that name.
    pub async fn create(pool: &PgPool, data: CreateSubscription) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (family_id, name, amount, billing_day, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, family_id, name, amount, billing_day, category, created_at
            "#,
        )
        .bind(data.family_id)
        .bind(data.name)
        .bind(data.amount)
        .bind(data.billing_day)
        .bind(data.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
        .fetch_one(pool)
        .await
    }

    /// Unscoped lookup; callers must check `belongs_to_family` before use.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, family_id, name, amount, billing_day, category, created_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Case-insensitive name lookup within a family
    pub async fn find_by_name(
        pool: &PgPool,
        family_id: i64,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, family_id, name, amount, billing_day, category, created_at
            FROM subscriptions
            WHERE family_id = $1 AND LOWER(name) = LOWER($2)
            "#,
        )
        .bind(family_id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_family(pool: &PgPool, family_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, family_id, name, amount, billing_day, category, created_at
            FROM subscriptions
            WHERE family_id = $1
            ORDER BY billing_day, name
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64, family_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1 AND family_id = $2")
            .bind(id)
            .bind(family_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
