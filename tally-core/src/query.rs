//! Spending questions ("how much did I spend on food last month?")
//! reduced to a filter: optional date range + optional category.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classifier::KeywordClassifier;
use crate::date_range::{DateRange, resolve_date_range};
use crate::expense::{Category, Expense};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseQuery {
    pub range: Option<DateRange>,
    pub category: Option<Category>,
}

impl ExpenseQuery {
    /// Parse a question. Explicit category names win over keyword hits.
    pub fn parse(text: &str, today: NaiveDate, classifier: &KeywordClassifier) -> Self {
        let lower = text.to_lowercase();
        let named = Category::ALL
            .iter()
            .copied()
            .filter(|c| *c != Category::Other)
            .find(|c| lower.contains(&c.as_str().to_lowercase()));

        Self {
            range: resolve_date_range(text, today),
            category: named.or_else(|| classifier.find(text)),
        }
    }

    pub fn matches(&self, e: &Expense) -> bool {
        self.range.is_none_or(|r| r.contains(e.date)) && self.category.is_none_or(|c| c == e.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_named_category_and_range() {
        let q = ExpenseQuery::parse(
            "How much did I spend on Food last month?",
            d(2026, 10, 16),
            &KeywordClassifier::default(),
        );
        assert_eq!(q.category, Some(Category::Food));
        assert_eq!(q.range, DateRange::month(2026, 9));
    }

    #[test]
    fn test_keyword_category() {
        let q = ExpenseQuery::parse("uber rides this week", d(2026, 10, 16), &KeywordClassifier::default());
        assert_eq!(q.category, Some(Category::Transport));
    }

    #[test]
    fn test_no_filters() {
        let q = ExpenseQuery::parse("total spending", d(2026, 10, 16), &KeywordClassifier::default());
        assert_eq!(q, ExpenseQuery::default());
    }

    #[test]
    fn test_matches() {
        let q = ExpenseQuery {
            range: DateRange::month(2026, 9),
            category: Some(Category::Food),
        };
        let e = Expense::manual("1", "Tea", 50.0, Category::Food, d(2026, 9, 3));
        assert!(q.matches(&e));
        let late = Expense::manual("2", "Tea", 50.0, Category::Food, d(2026, 10, 1));
        assert!(!q.matches(&late));
    }
}
