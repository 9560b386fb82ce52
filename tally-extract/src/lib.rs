//! tally-extract: receipt OCR text and chat sentences -> expense candidates

pub mod chain;
pub mod chat;
pub mod nl_date;
pub mod receipt;
pub mod text;

pub use chain::{Strategy, first_match};
pub use chat::{AmountSource, ChatExpenseParser, ChatParse, ParsedDetails};
pub use nl_date::{DateOrder, DateSettings, resolve_mentioned_date};
pub use receipt::{AmountTier, ReceiptParse, ReceiptParser};
