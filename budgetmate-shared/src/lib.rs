//! # BudgetMate Shared Library
//!
//! Data access and domain logic for the BudgetMate household finance tracker.
//! The API crate is a thin HTTP layer over what lives here.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and schema migrations
//! - `models`: Row types and their SQL, one module per table
//! - `auth`: Password hashing, session tokens and the session cache
//! - `fanout`: Task group used to run independent reads concurrently
//! - `voting`: Purchase-request quorum rules and the vote workflow
//! - `budget_view`: Monthly spend vs. limit grid
//! - `dashboard`: Home dashboard aggregation
//! - `insight`: Rule-based spending nudges
//! - `schedule`: Subscription due-date calculation
//! - `categorize`: Keyword and LLM-backed transaction categorizer
//! - `money`: Rupee formatting helpers

pub mod auth;
pub mod budget_view;
pub mod categorize;
pub mod dashboard;
pub mod db;
pub mod fanout;
pub mod insight;
pub mod models;
pub mod money;
pub mod schedule;
pub mod voting;

/// Current version of the BudgetMate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
