//! Next-month spending forecast: ordinary least squares over monthly totals.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use tally_core::Expense;

use crate::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub forecast: f64,
    /// Number of months with data that fed the fit
    pub months_used: usize,
}

/// (year, month) -> total, in calendar order
pub fn monthly_totals(expenses: &[Expense]) -> BTreeMap<(i32, u32), f64> {
    let mut out = BTreeMap::new();
    for e in expenses {
        *out.entry((e.date.year(), e.date.month())).or_insert(0.0) += e.amount;
    }
    out
}

/// Months with data are indexed 0..n in calendar order (gaps are not
/// counted) and a straight line is fitted through them; the forecast is the
/// line at index n. One month of data forecasts itself; none forecasts 0.
pub fn forecast_next_month(expenses: &[Expense]) -> Forecast {
    let totals: Vec<f64> = monthly_totals(expenses).into_values().collect();
    let forecast = match totals.len() {
        0 => 0.0,
        1 => totals[0],
        n => {
            let (slope, intercept) = least_squares(&totals);
            slope * n as f64 + intercept
        }
    };
    Forecast {
        forecast: round2(forecast),
        months_used: totals.len(),
    }
}

/// Fit y = slope * x + intercept with x = 0, 1, 2, ...
fn least_squares(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    let slope = if den == 0.0 { 0.0 } else { num / den };
    (slope, y_mean - slope * x_mean)
}
