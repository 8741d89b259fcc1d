/// Transaction model and aggregation queries
///
/// Amounts are stored non-negative; whether money came in or went out is
/// carried only by `type`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE transaction_type AS ENUM ('income', 'expense');
///
/// CREATE TABLE transactions (
///     id BIGSERIAL PRIMARY KEY,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
///     category VARCHAR(100) NOT NULL,
///     date DATE NOT NULL,
///     description TEXT NOT NULL,
///     type transaction_type NOT NULL,
///     user_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use budgetmate_shared::models::transaction::{CreateTransaction, Transaction, TransactionType};
/// use chrono::NaiveDate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, family_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
/// Transaction::create(&pool, CreateTransaction {
///     amount: 1299.0,
///     category: "Shopping".to_string(),
///     date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
///     description: "Headphones".to_string(),
///     kind: TransactionType::Expense,
///     user_id: Some(user_id),
///     family_id,
/// })
/// .await?;
///
/// let spent = Transaction::total_expenses(&pool, family_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use super::FamilyScoped;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Parses the form value; anything but the two known kinds is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub description: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub user_id: Option<i64>,
    pub family_id: i64,
}

#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionType,
    pub user_id: Option<i64>,
    pub family_id: i64,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransaction {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub kind: Option<TransactionType>,
}

impl UpdateTransaction {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.kind.is_none()
    }
}

/// Sum of amounts for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

impl FamilyScoped for Transaction {
    fn family_id(&self) -> i64 {
        self.family_id
    }
}

impl Transaction {
    pub async fn create<'e, E>(executor: E, data: CreateTransaction) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (amount, category, date, description, type, user_id, family_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, amount, category, date, description, type, user_id, family_id
            "#,
        )
        .bind(data.amount)
        .bind(data.category)
        .bind(data.date)
        .bind(data.description)
        .bind(data.kind)
        .bind(data.user_id)
        .bind(data.family_id)
        .fetch_one(executor)
        .await
    }

    /// Unscoped lookup; callers must check `belongs_to_family` before use.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, amount, category, date, description, type, user_id, family_id
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Every transaction of the family, newest first.
    pub async fn list_for_family(pool: &PgPool, family_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, amount, category, date, description, type, user_id, family_id
            FROM transactions
            WHERE family_id = $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// The `limit` most recent transactions.
    pub async fn recent(pool: &PgPool, family_id: i64, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, amount, category, date, description, type, user_id, family_id
            FROM transactions
            WHERE family_id = $1
            ORDER BY date DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(family_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Transactions dated on or after `since`, newest first.
    pub async fn since(
        pool: &PgPool,
        family_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, amount, category, date, description, type, user_id, family_id
            FROM transactions
            WHERE family_id = $1 AND date >= $2
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(family_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Applies the non-empty fields of `changes`. The family id is part of
    /// the predicate, so a row of another family is never touched.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        family_id: i64,
        changes: UpdateTransaction,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET amount = COALESCE($3, amount),
                category = COALESCE($4, category),
                date = COALESCE($5, date),
                description = COALESCE($6, description),
                type = COALESCE($7, type)
            WHERE id = $1 AND family_id = $2
            RETURNING id, amount, category, date, description, type, user_id, family_id
            "#,
        )
        .bind(id)
        .bind(family_id)
        .bind(changes.amount)
        .bind(changes.category)
        .bind(changes.date)
        .bind(changes.description)
        .bind(changes.kind)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64, family_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND family_id = $2")
            .bind(id)
            .bind(family_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All-time total for one direction; zero when the family has none.
    pub async fn total(
        pool: &PgPool,
        family_id: i64,
        kind: TransactionType,
    ) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION
            FROM transactions
            WHERE family_id = $1 AND type = $2
            "#,
        )
        .bind(family_id)
        .bind(kind)
        .fetch_one(pool)
        .await
    }

    pub async fn total_income(pool: &PgPool, family_id: i64) -> Result<f64, sqlx::Error> {
        Self::total(pool, family_id, TransactionType::Income).await
    }

    pub async fn total_expenses(pool: &PgPool, family_id: i64) -> Result<f64, sqlx::Error> {
        Self::total(pool, family_id, TransactionType::Expense).await
    }

    /// All-time expense totals per category, largest first.
    pub async fn category_breakdown(
        pool: &PgPool,
        family_id: i64,
    ) -> Result<Vec<CategoryTotal>, sqlx::Error> {
        sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, SUM(amount)::DOUBLE PRECISION AS total
            FROM transactions
            WHERE family_id = $1 AND type = 'expense'
            GROUP BY category
            ORDER BY total DESC, category
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Expense totals per category for one `YYYY-MM` month.
    pub async fn spending_for_month(
        pool: &PgPool,
        family_id: i64,
        month: &str,
    ) -> Result<Vec<CategoryTotal>, sqlx::Error> {
        sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, SUM(amount)::DOUBLE PRECISION AS total
            FROM transactions
            WHERE family_id = $1 AND type = 'expense' AND to_char(date, 'YYYY-MM') = $2
            GROUP BY category
            "#,
        )
        .bind(family_id)
        .bind(month)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!(TransactionType::parse("income"), Some(TransactionType::Income));
        assert_eq!(TransactionType::parse(" expense "), Some(TransactionType::Expense));
        assert_eq!(TransactionType::parse("transfer"), None);
        assert_eq!(TransactionType::parse(""), None);
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let tx = Transaction {
            id: 1,
            amount: 1299.0,
            category: "Shopping".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            description: "Headphones".to_string(),
            kind: TransactionType::Expense,
            user_id: Some(2),
            family_id: 3,
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2025-06-14");
        assert!(tx.belongs_to_family(3));
        assert!(!tx.belongs_to_family(4));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateTransaction::default().is_empty());
        let changes = UpdateTransaction {
            category: Some("Groceries".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
