//! Integration tests for budgets and the monthly budget grid
//!
//! These tests require a running PostgreSQL database (DATABASE_URL).

mod common;

use budgetmate_shared::budget_view::{self, BudgetStatus};
use budgetmate_shared::models::budget::Budget;
use budgetmate_shared::models::transaction::{CreateTransaction, Transaction, TransactionType};
use budgetmate_shared::voting::create_request;
use chrono::NaiveDate;
use common::{test_pool, TestFamily};
use sqlx::PgPool;

async fn expense(pool: &PgPool, family: &TestFamily, category: &str, amount: f64, date: NaiveDate) {
    Transaction::create(
        pool,
        CreateTransaction {
            amount,
            category: category.to_string(),
            date,
            description: format!("{} purchase", category),
            kind: TransactionType::Expense,
            user_id: Some(family.member(0).id),
            family_id: family.id(),
        },
    )
    .await
    .expect("Failed to create transaction");
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 1).await.unwrap();

    let first = Budget::upsert(&pool, family.id(), "Food", "2025-06", 5000.0).await.unwrap();
    let second = Budget::upsert(&pool, family.id(), "Food", "2025-06", 5000.0).await.unwrap();
    assert_eq!(first, second);

    let third = Budget::upsert(&pool, family.id(), "Food", "2025-06", 6500.0).await.unwrap();
    assert_eq!(third.id, first.id);
    assert_eq!(third.amount, 6500.0);
    assert_eq!(Budget::count_for(&pool, family.id(), "Food", "2025-06").await.unwrap(), 1);

    family.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_in_grid_covers_budgets_and_expenses() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 1).await.unwrap();

    assert!(!Budget::in_grid(&pool, family.id(), "Travel").await.unwrap());

    expense(&pool, &family, "Travel", 800.0, date(2025, 5, 2)).await;
    assert!(Budget::in_grid(&pool, family.id(), "Travel").await.unwrap());

    Budget::upsert(&pool, family.id(), "Gifts", "2025-07", 1000.0).await.unwrap();
    assert!(Budget::in_grid(&pool, family.id(), "Gifts").await.unwrap());

    family.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_three_quarters_spent_is_warning() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 1).await.unwrap();

    Budget::upsert(&pool, family.id(), "Food", "2025-06", 5000.0).await.unwrap();
    expense(&pool, &family, "Food", 2000.0, date(2025, 6, 3)).await;
    expense(&pool, &family, "Food", 1750.0, date(2025, 6, 20)).await;
    // Other months do not count
    expense(&pool, &family, "Food", 9999.0, date(2025, 5, 31)).await;

    let view = budget_view::load(&pool, family.id(), family.member(0).id, "2025-06")
        .await
        .unwrap();

    let food = view.row("Food").expect("Food row");
    assert_eq!(food.spent, 3750.0);
    assert_eq!(food.limit, 5000.0);
    assert_eq!(food.percentage, 75.0);
    assert_eq!(food.status, BudgetStatus::Warning);
    assert_eq!(view.month_label, "June 2025");

    family.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_category_universe_spans_all_months() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 1).await.unwrap();

    Budget::upsert(&pool, family.id(), "Rent", "2025-01", 20000.0).await.unwrap();
    expense(&pool, &family, "Travel", 800.0, date(2024, 11, 2)).await;
    Budget::upsert(&pool, family.id(), "Food", "2025-06", 5000.0).await.unwrap();

    let view = budget_view::load(&pool, family.id(), family.member(0).id, "2025-06")
        .await
        .unwrap();

    let categories: Vec<&str> = view.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Food", "Rent", "Travel"]);

    let travel = view.row("Travel").unwrap();
    assert_eq!(travel.spent, 0.0);
    assert_eq!(travel.status, BudgetStatus::Unset);
    assert_eq!(view.total_limit, 5000.0);
    assert_eq!(view.total_spent, 0.0);

    family.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_zero_limit_with_spend_is_unset() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 1).await.unwrap();

    Budget::upsert(&pool, family.id(), "Fun", "2025-06", 0.0).await.unwrap();
    expense(&pool, &family, "Fun", 450.0, date(2025, 6, 9)).await;

    let view = budget_view::load(&pool, family.id(), family.member(0).id, "2025-06")
        .await
        .unwrap();

    let fun = view.row("Fun").unwrap();
    assert_eq!(fun.spent, 450.0);
    assert_eq!(fun.percentage, 0.0);
    assert_eq!(fun.status, BudgetStatus::Unset);

    family.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_view_lists_pending_requests_for_viewer() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 2).await.unwrap();
    let requester = family.member(0);

    create_request(&pool, family.id(), requester.id, &requester.name, "Desk", 7000.0)
        .await
        .unwrap();

    let view = budget_view::load(&pool, family.id(), family.member(1).id, "2025-06")
        .await
        .unwrap();

    assert_eq!(view.requests.len(), 1);
    assert_eq!(view.requests[0].user_name, requester.name);
    assert_eq!(view.requests[0].total_voters, 2);
    assert!(!view.requests[0].user_voted);

    family.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_families_do_not_see_each_other() {
    let pool = test_pool().await.expect("Failed to set up database");
    let ours = TestFamily::create(&pool, 1).await.unwrap();
    let theirs = TestFamily::create(&pool, 1).await.unwrap();

    Budget::upsert(&pool, theirs.id(), "Secret", "2025-06", 100.0).await.unwrap();

    let view = budget_view::load(&pool, ours.id(), ours.member(0).id, "2025-06")
        .await
        .unwrap();
    assert!(view.row("Secret").is_none());

    ours.cleanup(&pool).await.unwrap();
    theirs.cleanup(&pool).await.unwrap();
}

#[tokio::test]
async fn test_grid_degrades_to_empty_when_store_fails() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 1).await.unwrap();

    Budget::upsert(&pool, family.id(), "Groceries", "2025-06", 5000.0).await.unwrap();
    expense(&pool, &family, "Groceries", 3750.0, date(2025, 6, 10)).await;

    // Every read on this pool fails with `PoolClosed`
    let closed = test_pool().await.unwrap();
    closed.close().await;

    let view = budget_view::load(&closed, family.id(), family.member(0).id, "2025-06")
        .await
        .expect("grid reads degrade instead of failing");

    assert!(view.rows.is_empty());
    assert!(view.requests.is_empty());
    assert_eq!(view.total_spent, 0.0);
    assert_eq!(view.total_limit, 0.0);
    assert_eq!(view.month, "2025-06");

    family.cleanup(&pool).await.unwrap();
}
