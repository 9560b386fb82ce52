//! Expense record types: extractor candidates and validated expenses

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Closed set of spending categories.
///
/// Declaration order matters: it is the tie-break order used by the
/// keyword classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(alias = "food")]
    Food,
    #[serde(alias = "transport")]
    Transport,
    #[serde(alias = "bills")]
    Bills,
    #[serde(alias = "shopping")]
    Shopping,
    #[serde(alias = "entertainment")]
    Entertainment,
    #[serde(alias = "other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Bills,
        Category::Shopping,
        Category::Entertainment,
        Category::Other,
    ];

    /// Canonical display form ("Food", "Bills", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Bills => "Bills",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    /// Case-insensitive: "food", "FOOD" and "Food" are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown category: {s}"))
    }
}

/// Where a candidate came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Receipt,
    Chat,
    Voice,
    Manual,
}

/// Unvalidated output of an extractor.
///
/// Built once per request and never mutated afterwards. `amount == 0.0`
/// means "not found".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedExpenseCandidate {
    pub title: String,
    pub amount: f64,
    pub category: Category,
    /// Serializes as YYYY-MM-DD
    pub date: NaiveDate,
    pub raw_text: String,
    pub source: Source,
}

impl ParsedExpenseCandidate {
    pub fn new(
        title: impl Into<String>,
        amount: f64,
        category: Category,
        date: NaiveDate,
        raw_text: impl Into<String>,
        source: Source,
    ) -> Self {
        Self {
            title: title.into(),
            amount: amount.max(0.0),
            category,
            date,
            raw_text: raw_text.into(),
            source,
        }
    }
}

/// A validated expense, ready for the persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl Expense {
    /// Promote a candidate. Rejects anything whose amount is not strictly positive.
    pub fn from_candidate(
        candidate: ParsedExpenseCandidate,
        id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !(candidate.amount > 0.0) || !candidate.amount.is_finite() {
            return Err(ValidationError::NonPositiveAmount(candidate.amount));
        }
        Ok(Self {
            id: id.into(),
            title: candidate.title,
            amount: candidate.amount,
            category: candidate.category,
            date: candidate.date,
            source: candidate.source,
            raw_text: Some(candidate.raw_text),
        })
    }

    /// Manually entered expense (no raw text to audit)
    pub fn manual(
        id: impl Into<String>,
        title: impl Into<String>,
        amount: f64,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            amount,
            category,
            date,
            source: Source::Manual,
            raw_text: None,
        }
    }
}

/// Fresh random id for a new expense
pub fn new_expense_id() -> String {
    Uuid::new_v4().to_string()
}
