/// Next charge dates for subscriptions
///
/// A subscription bills on `billing_day` every month. When the month is
/// shorter than that day the charge lands on the month's last day. If this
/// month's charge date has already passed, the next one is in the following
/// month.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::subscription::Subscription;

/// Days ahead within which a charge counts as "due soon"
pub const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    DueSoon,
    Upcoming,
}

impl DueStatus {
    pub fn from_days_until(days_until: i64) -> Self {
        match days_until {
            d if d < 0 => DueStatus::Overdue,
            0 => DueStatus::DueToday,
            d if d <= DUE_SOON_DAYS => DueStatus::DueSoon,
            _ => DueStatus::Upcoming,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingCharge {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub next_due_date: NaiveDate,
    pub days_until: i64,
    pub due_status: DueStatus,
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// `billing_day` in the given month, clamped to the month's length.
fn charge_date(year: i32, month: u32, billing_day: i32) -> Option<NaiveDate> {
    let day = (billing_day.max(1) as u32).min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The next charge on or after `today`.
pub fn next_due_date(billing_day: i32, today: NaiveDate) -> Option<NaiveDate> {
    let this_month = charge_date(today.year(), today.month(), billing_day)?;
    if this_month >= today {
        return Some(this_month);
    }

    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    charge_date(year, month, billing_day)
}

/// Subscriptions with their next charge, soonest first.
pub fn upcoming(subscriptions: Vec<Subscription>, today: NaiveDate) -> Vec<UpcomingCharge> {
    let mut charges: Vec<UpcomingCharge> = subscriptions
        .into_iter()
        .filter_map(|subscription| {
            let next_due_date = next_due_date(subscription.billing_day, today)?;
            let days_until = (next_due_date - today).num_days();
            Some(UpcomingCharge {
                subscription,
                next_due_date,
                days_until,
                due_status: DueStatus::from_days_until(days_until),
            })
        })
        .collect();

    charges.sort_by_key(|c| c.days_until);
    charges
}

/// Sum of every subscription's monthly amount
pub fn monthly_burn(subscriptions: &[Subscription]) -> f64 {
    subscriptions.iter().map(|s| s.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sub(name: &str, amount: f64, billing_day: i32) -> Subscription {
        Subscription {
            id: 0,
            family_id: 1,
            name: name.to_string(),
            amount,
            billing_day,
            category: "Subscriptions".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_due_later_this_month() {
        assert_eq!(next_due_date(20, date(2025, 6, 10)), Some(date(2025, 6, 20)));
    }

    #[test]
    fn test_due_today() {
        assert_eq!(next_due_date(10, date(2025, 6, 10)), Some(date(2025, 6, 10)));
    }

    #[test]
    fn test_passed_rolls_to_next_month() {
        assert_eq!(next_due_date(5, date(2025, 6, 10)), Some(date(2025, 7, 5)));
        assert_eq!(next_due_date(5, date(2025, 12, 10)), Some(date(2026, 1, 5)));
    }

    #[test]
    fn test_clamped_to_short_month() {
        assert_eq!(next_due_date(31, date(2025, 2, 10)), Some(date(2025, 2, 28)));
        assert_eq!(next_due_date(31, date(2024, 2, 10)), Some(date(2024, 2, 29)));
        assert_eq!(next_due_date(31, date(2025, 4, 1)), Some(date(2025, 4, 30)));
    }

    #[test]
    fn test_rollover_uses_full_billing_day() {
        // Past Feb 28: the next charge is March 31, not March 28
        assert_eq!(next_due_date(31, date(2025, 3, 1)), Some(date(2025, 3, 31)));
        assert_eq!(next_due_date(30, date(2025, 1, 31)), Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_status() {
        assert_eq!(DueStatus::from_days_until(-1), DueStatus::Overdue);
        assert_eq!(DueStatus::from_days_until(0), DueStatus::DueToday);
        assert_eq!(DueStatus::from_days_until(3), DueStatus::DueSoon);
        assert_eq!(DueStatus::from_days_until(4), DueStatus::Upcoming);
    }

    #[test]
    fn test_upcoming_sorted_by_days_until() {
        let today = date(2025, 6, 10);
        let charges = upcoming(
            vec![sub("Gym", 1500.0, 9), sub("Netflix", 649.0, 12), sub("Cloud", 130.0, 10)],
            today,
        );

        let names: Vec<&str> = charges.iter().map(|c| c.subscription.name.as_str()).collect();
        assert_eq!(names, vec!["Cloud", "Netflix", "Gym"]);
        assert_eq!(charges[0].due_status, DueStatus::DueToday);
        assert_eq!(charges[1].due_status, DueStatus::DueSoon);
        assert_eq!(charges[2].days_until, 29);
    }

    #[test]
    fn test_monthly_burn() {
        assert_eq!(monthly_burn(&[sub("A", 199.0, 1), sub("B", 301.0, 2)]), 500.0);
        assert_eq!(monthly_burn(&[]), 0.0);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&DueStatus::DueToday).unwrap(), "\"due-today\"");
    }
}
