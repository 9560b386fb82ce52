//! Category breakdown, weekly trend and chart points.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use tally_core::{Category, Expense};

use crate::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub by_category: Vec<CategoryTotal>,
    /// ISO week ("2026-W07") -> total
    pub weekly_trend: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

pub fn insights(expenses: &[Expense]) -> Insights {
    Insights {
        by_category: by_category(expenses),
        weekly_trend: weekly_trend(expenses),
    }
}

/// Sorted by total, largest first
pub fn by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut groups: HashMap<Category, (f64, usize)> = HashMap::new();
    for e in expenses {
        let g = groups.entry(e.category).or_default();
        g.0 += e.amount;
        g.1 += 1;
    }

    let mut out: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total: round2(total),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    out
}

pub fn week_key(d: NaiveDate) -> String {
    let w = d.iso_week();
    format!("{}-W{:02}", w.year(), w.week())
}

pub fn weekly_trend(expenses: &[Expense]) -> BTreeMap<String, f64> {
    let mut weeks: BTreeMap<String, f64> = BTreeMap::new();
    for e in expenses {
        *weeks.entry(week_key(e.date)).or_insert(0.0) += e.amount;
    }
    weeks.values_mut().for_each(|v| *v = round2(*v));
    weeks
}

pub fn graph_points(expenses: &[Expense]) -> Vec<GraphPoint> {
    let mut points: Vec<GraphPoint> = expenses
        .iter()
        .map(|e| GraphPoint {
            date: e.date,
            amount: e.amount,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}
