/// Monthly category budgets
///
/// A budget is a display-only ceiling: nothing stops spending past it. There
/// is at most one row per (family, category, month) and saving again
/// overwrites the amount.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE budgets (
///     id BIGSERIAL PRIMARY KEY,
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     category VARCHAR(100) NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
///     month VARCHAR(7) NOT NULL CHECK (month ~ '^[0-9]{4}-[0-9]{2}$'),
///     CONSTRAINT budgets_family_category_month_key UNIQUE (family_id, category, month)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Budget {
    pub id: i64,
    pub family_id: i64,
    pub category: String,
    pub amount: f64,
    /// `YYYY-MM`
    pub month: String,
}

impl Budget {
    /// Inserts or overwrites the limit for (family, category, month).
    pub async fn upsert(
        pool: &PgPool,
        family_id: i64,
        category: &str,
        month: &str,
        amount: f64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (family_id, category, month, amount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (family_id, category, month)
            DO UPDATE SET amount = EXCLUDED.amount
            RETURNING id, family_id, category, amount, month
            "#,
        )
        .bind(family_id)
        .bind(category)
        .bind(month)
        .bind(amount)
        .fetch_one(pool)
        .await
    }

    /// Limits set for one month.
    pub async fn for_month(
        pool: &PgPool,
        family_id: i64,
        month: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, family_id, category, amount, month
            FROM budgets
            WHERE family_id = $1 AND month = $2
            ORDER BY category
            "#,
        )
        .bind(family_id)
        .bind(month)
        .fetch_all(pool)
        .await
    }

    /// Category universe of the budget grid: every expense category the
    /// family has ever used plus every category it has ever budgeted,
    /// regardless of month.
    pub async fn all_categories(pool: &PgPool, family_id: i64) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT category FROM transactions WHERE family_id = $1 AND type = 'expense'
            UNION
            SELECT category FROM budgets WHERE family_id = $1
            ORDER BY category
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Whether `category` already has a row in the budget grid, in any month.
    pub async fn in_grid(pool: &PgPool, family_id: i64, category: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transactions
                WHERE family_id = $1 AND type = 'expense' AND category = $2
            ) OR EXISTS (
                SELECT 1 FROM budgets WHERE family_id = $1 AND category = $2
            )
            "#,
        )
        .bind(family_id)
        .bind(category)
        .fetch_one(pool)
        .await
    }

    pub async fn count_for(
        pool: &PgPool,
        family_id: i64,
        category: &str,
        month: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM budgets WHERE family_id = $1 AND category = $2 AND month = $3",
        )
        .bind(family_id)
        .bind(category)
        .bind(month)
        .fetch_one(pool)
        .await
    }
}
