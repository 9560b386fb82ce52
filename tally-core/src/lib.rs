//! tally-core: expense model, category classifier and date-range resolution

pub mod classifier;
pub mod date_range;
pub mod error;
pub mod expense;
pub mod query;
pub mod time;

pub use classifier::{CATEGORY_KEYWORDS, Classify, KeywordClassifier};
pub use date_range::{DateRange, resolve_date_range};
pub use error::{ParseError, ValidationError};
pub use expense::{Category, Expense, ParsedExpenseCandidate, Source, new_expense_id};
pub use query::ExpenseQuery;
