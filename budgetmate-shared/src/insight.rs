/// Spending nudges for the dashboard
///
/// Both functions look only at the transactions they are given, normally the
/// family's last 30 days, newest first.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::transaction::{Transaction, TransactionType};

/// Icon hint for the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightIcon {
    Sparkles,
    TrendingUp,
    Heart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub message: String,
    /// Category being highlighted, if any
    pub category: Option<String>,
    /// Share of total spend held by `category`
    pub percentage: f64,
    pub is_positive: bool,
    pub icon: InsightIcon,
}

impl Insight {
    fn general(message: &str, icon: InsightIcon) -> Self {
        Self {
            message: message.to_string(),
            category: None,
            percentage: 0.0,
            is_positive: true,
            icon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendingTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// Expense totals per category, largest first. Ties sort by name.
fn ranked_categories(transactions: &[Transaction]) -> (Vec<(String, f64)>, f64) {
    let mut by_category: HashMap<&str, f64> = HashMap::new();
    let mut total = 0.0;

    for t in transactions.iter().filter(|t| t.kind == TransactionType::Expense) {
        *by_category.entry(t.category.as_str()).or_default() += t.amount;
        total += t.amount;
    }

    let mut ranked: Vec<(String, f64)> = by_category
        .into_iter()
        .map(|(name, amount)| (name.to_string(), amount))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    (ranked, total)
}

pub fn generate_insight(transactions: &[Transaction]) -> Insight {
    if transactions.is_empty() {
        return Insight::general(
            "Welcome to BudgetMate! Start by adding some transactions to see personalized insights.",
            InsightIcon::Sparkles,
        );
    }

    let (ranked, total_expense) = ranked_categories(transactions);
    let Some((top_name, top_amount)) = ranked.first().filter(|_| total_expense > 0.0) else {
        return Insight::general(
            "No expenses recorded yet. You're off to a great start!",
            InsightIcon::Heart,
        );
    };

    let percentage = top_amount / total_expense * 100.0;

    if percentage > 40.0 {
        Insight {
            message: format!(
                "{} is {:.0}% of your spending. Was there a special occasion, or is this a pattern worth exploring?",
                top_name, percentage
            ),
            category: Some(top_name.clone()),
            percentage,
            is_positive: false,
            icon: InsightIcon::Sparkles,
        }
    } else if percentage > 30.0 {
        Insight {
            message: format!(
                "{} leads your spending at {:.0}%. Might be worth a quick look to see if it aligns with your priorities.",
                top_name, percentage
            ),
            category: Some(top_name.clone()),
            percentage,
            is_positive: true,
            icon: InsightIcon::TrendingUp,
        }
    } else if ranked.len() >= 3 {
        Insight::general(
            "Your spending is beautifully balanced across categories. You're maintaining excellent financial discipline!",
            InsightIcon::Heart,
        )
    } else {
        Insight::general(
            "Looking good! Your expenses are focused and intentional. Keep tracking to discover more patterns.",
            InsightIcon::Sparkles,
        )
    }
}

/// Compares expense totals of the first and second half of `transactions`.
/// A change within ten percent either way is `Stable`.
pub fn spending_trend(transactions: &[Transaction]) -> SpendingTrend {
    if transactions.len() < 2 {
        return SpendingTrend::Stable;
    }

    let mid = transactions.len() / 2;
    let half_total = |half: &[Transaction]| -> f64 {
        half.iter()
            .filter(|t| t.kind == TransactionType::Expense)
            .map(|t| t.amount)
            .sum()
    };
    let first = half_total(&transactions[..mid]);
    let second = half_total(&transactions[mid..]);

    if second > first * 1.1 {
        SpendingTrend::Increasing
    } else if second < first * 0.9 {
        SpendingTrend::Decreasing
    } else {
        SpendingTrend::Stable
    }
}
