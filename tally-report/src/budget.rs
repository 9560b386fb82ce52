//! How much can still be spent per day this month.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use tally_core::Expense;
use tally_core::date_range::first_of_next_month;

use crate::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLimit {
    pub limit: f64,
    pub remaining_budget: f64,
    pub remaining_days: i64,
}

/// Spread what is left of `monthly_budget` over the days until the first of
/// next month. Only expenses dated in `today`'s month count as spent.
pub fn daily_limit(expenses: &[Expense], monthly_budget: f64, today: NaiveDate) -> DailyLimit {
    let spent: f64 = expenses
        .iter()
        .filter(|e| e.date.year() == today.year() && e.date.month() == today.month())
        .map(|e| e.amount)
        .sum();

    let remaining_days = first_of_next_month(today)
        .map(|next| (next - today).num_days())
        .unwrap_or(0);
    let remaining_budget = monthly_budget - spent;
    let limit = if remaining_days > 0 {
        remaining_budget / remaining_days as f64
    } else {
        0.0
    };

    DailyLimit {
        limit: round2(limit),
        remaining_budget: round2(remaining_budget),
        remaining_days,
    }
}
