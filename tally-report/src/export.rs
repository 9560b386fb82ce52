//! CSV export of stored expenses.
//!
//! Columns: id,date,title,amount,category,source

use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

use tally_core::{Category, Expense, Source};

use crate::error::ReportError;

#[derive(Debug, Serialize)]
struct Row {
    id: String,
    date: NaiveDate,
    title: String,
    amount: f64,
    category: Category,
    source: Source,
}

pub fn write_csv<W: Write>(expenses: &[Expense], out: W) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(out);
    for e in expenses {
        wtr.serialize(Row {
            id: e.id.clone(),
            date: e.date,
            title: e.title.clone(),
            amount: e.amount,
            category: e.category,
            source: e.source,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_header_and_row() {
        let e = vec![Expense::manual(
            "e1",
            "Burger @ Kfc",
            500.0,
            Category::Food,
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        )];
        let mut buf = Vec::new();
        write_csv(&e, &mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        let mut lines = s.lines();
        assert_eq!(lines.next(), Some("id,date,title,amount,category,source"));
        assert_eq!(lines.next(), Some("e1,2026-10-16,Burger @ Kfc,500.0,Food,manual"));
    }
}
