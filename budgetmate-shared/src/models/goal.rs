/// Savings goals
///
/// # Schema
///
/// ```sql
/// CREATE TABLE goals (
///     id BIGSERIAL PRIMARY KEY,
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     target_amount DOUBLE PRECISION NOT NULL CHECK (target_amount > 0),
///     current_amount DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (current_amount >= 0),
///     icon VARCHAR(64) NOT NULL DEFAULT 'target',
///     deadline DATE,
///     color VARCHAR(16) NOT NULL DEFAULT '#10B981',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::FamilyScoped;

pub const DEFAULT_ICON: &str = "target";
pub const DEFAULT_COLOR: &str = "#10B981";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: i64,
    pub family_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub icon: String,
    pub deadline: Option<NaiveDate>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateGoal {
    pub family_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl FamilyScoped for Goal {
    fn family_id(&self) -> i64 {
        self.family_id
    }
}

impl Goal {
    /// Progress towards the target, 0-100.
    pub fn percentage(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    pub async fn create(pool: &PgPool, data: CreateGoal) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (family_id, name, target_amount, deadline, icon, color)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, family_id, name, target_amount, current_amount, icon, deadline,
                      color, created_at
            "#,
        )
        .bind(data.family_id)
        .bind(data.name)
        .bind(data.target_amount)
        .bind(data.deadline)
        .bind(data.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()))
        .bind(data.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()))
        .fetch_one(pool)
        .await
    }

    /// Unscoped lookup; callers must check `belongs_to_family` before use.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, family_id, name, target_amount, current_amount, icon, deadline,
                   color, created_at
            FROM goals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_family(pool: &PgPool, family_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, family_id, name, target_amount, current_amount, icon, deadline,
                   color, created_at
            FROM goals
            WHERE family_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Adds `amount` to the saved total, never past the target.
    pub async fn contribute(
        pool: &PgPool,
        id: i64,
        family_id: i64,
        amount: f64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET current_amount = LEAST(current_amount + $3, target_amount)
            WHERE id = $1 AND family_id = $2
            RETURNING id, family_id, name, target_amount, current_amount, icon, deadline,
                      color, created_at
            "#,
        )
        .bind(id)
        .bind(family_id)
        .bind(amount)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64, family_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND family_id = $2")
            .bind(id)
            .bind(family_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
