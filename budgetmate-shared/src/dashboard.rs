/// Family dashboard
///
/// [`load`] issues five independent reads on one [`TaskGroup`]:
///
/// | Read                         | On error              |
/// |------------------------------|-----------------------|
/// | 5 most recent transactions   | fails the dashboard   |
/// | total income                 | fails the dashboard   |
/// | total expenses               | fails the dashboard   |
/// | expense breakdown (all time) | fails the dashboard   |
/// | last 30 days of transactions | treated as empty      |
///
/// The first hard failure cancels the group, so reads that have not started
/// yet are skipped. Balance is derived as `income - expenses`; the insight
/// is computed from the 30-day set.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use crate::fanout::{FanOutError, TaskGroup};
use crate::insight::{generate_insight, spending_trend, Insight, SpendingTrend};
use crate::models::transaction::{CategoryTotal, Transaction};

/// Transactions shown in the "recent activity" list
pub const RECENT_LIMIT: i64 = 5;

/// Window the insight looks at
pub const INSIGHT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub recent_transactions: Vec<Transaction>,
    pub category_breakdown: Vec<CategoryTotal>,
    pub insight: Insight,
    pub trend: SpendingTrend,
}

pub async fn load(
    pool: &PgPool,
    family_id: i64,
    today: NaiveDate,
) -> Result<Dashboard, FanOutError<sqlx::Error>> {
    let mut group: TaskGroup<sqlx::Error> = TaskGroup::new();

    let recent = {
        let pool = pool.clone();
        group.spawn(async move { Transaction::recent(&pool, family_id, RECENT_LIMIT).await })
    };

    let income = {
        let pool = pool.clone();
        group.spawn(async move { Transaction::total_income(&pool, family_id).await })
    };

    let expenses = {
        let pool = pool.clone();
        group.spawn(async move { Transaction::total_expenses(&pool, family_id).await })
    };

    let breakdown = {
        let pool = pool.clone();
        group.spawn(async move { Transaction::category_breakdown(&pool, family_id).await })
    };

    let window = {
        let pool = pool.clone();
        let since = today - Duration::days(INSIGHT_WINDOW_DAYS);
        group.spawn(async move {
            match Transaction::since(&pool, family_id, since).await {
                Ok(transactions) => Ok(transactions),
                Err(e) => {
                    warn!(family_id, error = %e, "Insight window query failed; using empty set");
                    Ok(Vec::new())
                }
            }
        })
    };

    group.wait().await?;

    let total_income = income.take().unwrap_or_default();
    let total_expenses = expenses.take().unwrap_or_default();
    let window = window.take().unwrap_or_default();

    Ok(Dashboard {
        balance: total_income - total_expenses,
        total_income,
        total_expenses,
        recent_transactions: recent.take().unwrap_or_default(),
        category_breakdown: breakdown.take().unwrap_or_default(),
        insight: generate_insight(&window),
        trend: spending_trend(&window),
    })
}
