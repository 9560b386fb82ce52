//! Monthly summary and spending-question answers.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use tally_core::{Category, Expense, ExpenseQuery};

use crate::error::ReportError;
use crate::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighestExpense {
    pub title: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total: f64,
    pub count: usize,
    pub highest: Option<HighestExpense>,
}

impl MonthlySummary {
    pub fn to_text(&self) -> String {
        let mut s = format!(
            "Summary for {}\n- Total Expenses: Rs.{:.2}\n- Number of Entries: {}",
            self.month, self.total, self.count
        );
        if let Some(h) = &self.highest {
            s.push_str(&format!(
                "\n- Highest Expense: {} (Rs.{:.2}) on {}",
                h.title, h.amount, h.date
            ));
        }
        s
    }
}

/// "2026-03" -> (2026, 3)
pub fn parse_month(month: &str) -> Result<(i32, u32), ReportError> {
    let bad = || ReportError::InvalidMonth(month.to_string());
    let (y, m) = month.trim().split_once('-').ok_or_else(bad)?;
    let y: i32 = y.parse().map_err(|_| bad())?;
    let m: u32 = m.parse().map_err(|_| bad())?;
    if y.to_string().len() != 4 || !(1..=12).contains(&m) {
        return Err(bad());
    }
    Ok((y, m))
}

pub fn monthly_summary(expenses: &[Expense], month: &str) -> Result<MonthlySummary, ReportError> {
    let (y, m) = parse_month(month)?;
    let in_month: Vec<&Expense> = expenses
        .iter()
        .filter(|e| e.date.year() == y && e.date.month() == m)
        .collect();

    let highest = in_month
        .iter()
        .copied()
        .reduce(|best, e| if e.amount > best.amount { e } else { best })
        .map(|e| HighestExpense {
            title: e.title.clone(),
            amount: e.amount,
            date: e.date,
        });

    Ok(MonthlySummary {
        month: format!("{y:04}-{m:02}"),
        total: round2(in_month.iter().map(|e| e.amount).sum()),
        count: in_month.len(),
        highest,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingAnswer {
    pub query: ExpenseQuery,
    pub total: f64,
    pub count: usize,
    pub expenses: Vec<Expense>,
}

impl SpendingAnswer {
    pub fn to_text(&self) -> String {
        let what = self.query.category.map_or("everything".to_string(), |c| c.to_string());
        let when = match self.query.range {
            Some(r) if r.start() == r.end() => format!("on {}", r.start()),
            Some(r) => format!("from {} to {}", r.start(), r.end()),
            None => "across all records".to_string(),
        };
        format!("You spent Rs.{:.2} on {what} {when} ({} entries).", self.total, self.count)
    }
}

pub fn answer_query(expenses: &[Expense], query: ExpenseQuery) -> SpendingAnswer {
    let hits: Vec<Expense> = expenses.iter().filter(|e| query.matches(e)).cloned().collect();
    SpendingAnswer {
        query,
        total: round2(hits.iter().map(|e| e.amount).sum()),
        count: hits.len(),
        expenses: hits,
    }
}

/// Totals per category, for context in advice prompts
pub fn category_totals(expenses: &[Expense]) -> Vec<(Category, f64)> {
    Category::ALL
        .iter()
        .map(|c| {
            let t: f64 = expenses.iter().filter(|e| e.category == *c).map(|e| e.amount).sum();
            (*c, round2(t))
        })
        .filter(|(_, t)| *t > 0.0)
        .collect()
}
