//! tally-report: expense store, summaries, insights, daily limit, forecast and CSV export

pub mod budget;
pub mod error;
pub mod export;
pub mod forecast;
pub mod insights;
pub mod store;
pub mod summary;

pub use budget::{DailyLimit, daily_limit};
pub use error::{ReportError, StoreError};
pub use forecast::{Forecast, forecast_next_month};
pub use insights::{GraphPoint, Insights, graph_points, insights};
pub use store::{ExpenseStore, JsonFileStore, MemoryStore};
pub use summary::{MonthlySummary, SpendingAnswer, answer_query, monthly_summary};

/// Round to cents for display
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
