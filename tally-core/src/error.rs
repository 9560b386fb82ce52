//! Error types shared by the extraction and reporting crates.

use thiserror::Error;

/// Hard failures of the chat/voice expense pipeline.
///
/// Missing dates and categories are never errors; they fall back to
/// today / the default category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty text")]
    EmptyInput,

    #[error("Could not detect amount")]
    AmountNotFound,
}

/// A candidate could not be promoted to an expense
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("amount must be greater than zero (got {0})")]
    NonPositiveAmount(f64),
}
