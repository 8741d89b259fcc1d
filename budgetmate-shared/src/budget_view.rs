/// Monthly budget grid
///
/// For one family and month, [`load`] builds one row per category. The
/// category list is every expense category the family has ever used plus
/// every category it has ever budgeted, sorted by name. Spend and limits are
/// taken from the requested month only.
///
/// Four reads run concurrently on a [`TaskGroup`]:
///
/// 1. spend per category for the month
/// 2. limits for the month
/// 3. the category list
/// 4. pending purchase requests, as seen by the viewer
///
/// None of them is load-bearing. A failed read is logged and treated as
/// empty, so the grid always renders.
///
/// # Example
///
/// ```
/// use budgetmate_shared::budget_view::{classify, BudgetStatus};
///
/// assert_eq!(classify(3750.0, 5000.0), (75.0, BudgetStatus::Warning));
/// assert_eq!(classify(120.0, 0.0), (0.0, BudgetStatus::Unset));
/// ```

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::warn;

use crate::fanout::{FanOutError, TaskGroup};
use crate::models::budget::Budget;
use crate::models::purchase_request::{PurchaseRequest, RequestCard};
use crate::models::transaction::Transaction;

/// Share of the limit at which a category turns `Warning`
pub const WARNING_PERCENT: f64 = 75.0;

/// Share of the limit at which a category turns `Danger`
pub const DANGER_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Safe,
    Warning,
    Danger,
    /// No limit set for the month
    Unset,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Safe => "safe",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Danger => "danger",
            BudgetStatus::Unset => "unset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRow {
    pub category: String,
    pub spent: f64,
    pub limit: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetView {
    /// `YYYY-MM`
    pub month: String,
    /// e.g. `June 2025`
    pub month_label: String,
    pub rows: Vec<BudgetRow>,
    pub total_spent: f64,
    pub total_limit: f64,
    pub requests: Vec<RequestCard>,
}

impl BudgetView {
    pub fn row(&self, category: &str) -> Option<&BudgetRow> {
        self.rows.iter().find(|row| row.category == category)
    }
}

/// Percentage of `limit` used and the resulting status. A limit of zero or
/// less means unset, whatever was spent.
pub fn classify(spent: f64, limit: f64) -> (f64, BudgetStatus) {
    if limit <= 0.0 {
        return (0.0, BudgetStatus::Unset);
    }

    let percentage = spent / limit * 100.0;
    let status = if percentage >= DANGER_PERCENT {
        BudgetStatus::Danger
    } else if percentage >= WARNING_PERCENT {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Safe
    };
    (percentage, status)
}

/// First day of a `YYYY-MM` month, or `None` if `month` is malformed.
pub fn parse_month(month: &str) -> Option<NaiveDate> {
    if month.len() != 7 {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").ok()
}

pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// `2025-06` -> `June 2025`. Malformed input is returned unchanged.
pub fn month_label(month: &str) -> String {
    match parse_month(month) {
        Some(first) => first.format("%B %Y").to_string(),
        None => month.to_string(),
    }
}

/// The requested month if well formed, otherwise the month of `today`.
pub fn month_or_current(requested: Option<&str>, today: NaiveDate) -> String {
    match requested.map(str::trim) {
        Some(month) if parse_month(month).is_some() => month.to_string(),
        _ => month_of(today),
    }
}

/// Builds rows from the three maps. Totals cover the listed categories only.
pub fn build_rows(
    categories: &[String],
    spending: &HashMap<String, f64>,
    limits: &HashMap<String, f64>,
) -> (Vec<BudgetRow>, f64, f64) {
    let mut rows = Vec::with_capacity(categories.len());
    let mut total_spent = 0.0;
    let mut total_limit = 0.0;

    for category in categories {
        let spent = spending.get(category).copied().unwrap_or(0.0);
        let limit = limits.get(category).copied().unwrap_or(0.0);
        let (percentage, status) = classify(spent, limit);

        total_spent += spent;
        total_limit += limit;
        rows.push(BudgetRow {
            category: category.clone(),
            spent,
            limit,
            percentage,
            status,
        });
    }

    (rows, total_spent, total_limit)
}

fn or_empty<T: Default>(what: &'static str, family_id: i64, result: Result<T, sqlx::Error>) -> T {
    result.unwrap_or_else(|e| {
        warn!(family_id, query = what, error = %e, "Budget sub-query failed; using empty result");
        T::default()
    })
}

/// Loads the grid for `family_id` and `month` as seen by `viewer_id`.
///
/// Only a panicked sub-query fails the call.
pub async fn load(
    pool: &PgPool,
    family_id: i64,
    viewer_id: i64,
    month: &str,
) -> Result<BudgetView, FanOutError<sqlx::Error>> {
    let mut group: TaskGroup<sqlx::Error> = TaskGroup::new();

    let spending = {
        let pool = pool.clone();
        let month = month.to_string();
        group.spawn(async move {
            let totals = Transaction::spending_for_month(&pool, family_id, &month).await;
            Ok(or_empty("spending", family_id, totals)
                .into_iter()
                .map(|t| (t.category, t.total))
                .collect::<HashMap<_, _>>())
        })
    };

    let limits = {
        let pool = pool.clone();
        let month = month.to_string();
        group.spawn(async move {
            let budgets = Budget::for_month(&pool, family_id, &month).await;
            Ok(or_empty("limits", family_id, budgets)
                .into_iter()
                .map(|b| (b.category, b.amount))
                .collect::<HashMap<_, _>>())
        })
    };

    let categories = {
        let pool = pool.clone();
        group.spawn(async move {
            Ok(or_empty("categories", family_id, Budget::all_categories(&pool, family_id).await))
        })
    };

    let requests = {
        let pool = pool.clone();
        group.spawn(async move {
            let cards = PurchaseRequest::pending_cards(&pool, family_id, viewer_id).await;
            Ok(or_empty("requests", family_id, cards))
        })
    };

    group.wait().await?;

    let spending = spending.take().unwrap_or_default();
    let limits = limits.take().unwrap_or_default();
    let categories = categories.take().unwrap_or_default();
    let (rows, total_spent, total_limit) = build_rows(&categories, &spending, &limits);

    Ok(BudgetView {
        month: month.to_string(),
        month_label: month_label(month),
        rows,
        total_spent,
        total_limit,
        requests: requests.take().unwrap_or_default(),
    })
}
