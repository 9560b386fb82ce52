//! Chat / voice sentence -> expense candidate.
//!
//! "I ate a burger for 500 rs at KFC" becomes
//! `Burger @ Kfc`, 500.0, Food, today.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

use tally_core::{Category, Classify, KeywordClassifier, ParseError, ParsedExpenseCandidate, Source};

use crate::chain::{Strategy, first_match};
use crate::nl_date::{DateSettings, resolve_mentioned_date};
use crate::text::{parse_amount, take_chars, title_case};

pub const FALLBACK_TITLE: &str = "Expense";
const TITLE_PREFIX_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    /// "rs 500", "500 pkr"
    Currency,
    /// first plain number in the sentence
    BareNumber,
}

pub const AMOUNT_CHAIN: [Strategy<AmountSource, f64>; 2] = [
    Strategy::new(AmountSource::Currency, currency_amount),
    Strategy::new(AmountSource::BareNumber, first_number),
];

/// The "parsed" block returned alongside the candidate so a user can fix
/// a misparse before confirming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDetails {
    pub amount: f64,
    pub date: NaiveDate,
    pub merchant: Option<String>,
    pub item: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatParse {
    pub candidate: ParsedExpenseCandidate,
    pub merchant: Option<String>,
    pub item: Option<String>,
    pub amount_source: AmountSource,
}

impl ChatParse {
    pub fn details(&self) -> ParsedDetails {
        ParsedDetails {
            amount: self.candidate.amount,
            date: self.candidate.date,
            merchant: self.merchant.clone(),
            item: self.item.clone(),
            category: self.candidate.category,
        }
    }
}

pub struct ChatExpenseParser<C = KeywordClassifier> {
    classifier: C,
    dates: DateSettings,
}

impl Default for ChatExpenseParser {
    fn default() -> Self {
        Self::new(KeywordClassifier::default())
    }
}

impl<C: Classify> ChatExpenseParser<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            dates: DateSettings::default(),
        }
    }

    pub fn with_date_settings(mut self, dates: DateSettings) -> Self {
        self.dates = dates;
        self
    }

    /// Parse one sentence. Fails only when the text is blank or holds no
    /// amount at all; everything else falls back to a default.
    pub fn parse(&self, text: &str, now: NaiveDateTime, source: Source) -> Result<ChatParse, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let (amount_source, amount) = first_match(&AMOUNT_CHAIN, text).ok_or(ParseError::AmountNotFound)?;
        debug!(?amount_source, amount, "chat amount found");

        let date = resolve_mentioned_date(text, now, self.dates).unwrap_or(now.date());
        let merchant = extract_merchant(text);
        let item = extract_item(text);
        let title = synthesize_title(text, item.as_deref(), merchant.as_deref());
        let category = self.classifier.classify(text);

        Ok(ChatParse {
            candidate: ParsedExpenseCandidate::new(title, amount, category, date, text, source),
            merchant,
            item,
            amount_source,
        })
    }
}

fn currency_res() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            r"(?i)\b(?:rs\.?|pkr)\s*(\d[\d,]*(?:\.\d{1,2})?)",
            r"(?i)(\d[\d,]*(?:\.\d{1,2})?)\s*(?:rs|pkr)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid currency regex"))
        .collect()
    })
}

fn bare_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?").expect("invalid number regex"))
}

fn merchant_res() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [r"(?i)\bat\s+([a-z0-9&'\- \t]+)", r"(?i)\bfrom\s+([a-z0-9&'\- \t]+)"]
            .iter()
            .map(|p| Regex::new(p).expect("invalid merchant regex"))
            .collect()
    })
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:ate|had|ordered|bought|purchased|got|paid)\s+(?:(?:a|an|the)\s+)?([a-z\s]+?)(?:\s+for|\s+of|\s+at|\s+from|\s+\d|\.|$)",
        )
        .expect("invalid item regex")
    })
}

/// Amount next to a currency marker, checked marker-first then marker-after.
pub fn currency_amount(text: &str) -> Option<f64> {
    currency_res()
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| parse_amount(c.get(1)?.as_str())))
}

/// First number in the text, grouped or plain, with optional decimals.
pub fn first_number(text: &str) -> Option<f64> {
    bare_number_re().find(text).and_then(|m| parse_amount(m.as_str()))
}

/// "at KFC" / "from Imtiaz" up to the end of the line, title-cased
pub fn extract_merchant(text: &str) -> Option<String> {
    merchant_res().iter().find_map(|re| {
        let phrase = re.captures(text)?.get(1)?.as_str().trim();
        (!phrase.is_empty()).then(|| title_case(phrase))
    })
}

/// Object of a purchase verb: "ate a burger for ..." -> "Burger"
pub fn extract_item(text: &str) -> Option<String> {
    let item = item_re().captures(text)?.get(1)?.as_str().trim();
    (!item.is_empty()).then(|| title_case(item))
}

/// Item and merchant if both are known, either one alone, else the opening
/// words of the message.
pub fn synthesize_title(text: &str, item: Option<&str>, merchant: Option<&str>) -> String {
    match (item, merchant) {
        (Some(i), Some(m)) => format!("{i} @ {m}"),
        (Some(i), None) => i.to_string(),
        (None, Some(m)) => m.to_string(),
        (None, None) => {
            let prefix = take_chars(text, TITLE_PREFIX_CHARS).trim().trim_end_matches('.');
            if prefix.is_empty() {
                FALLBACK_TITLE.to_string()
            } else {
                prefix.to_string()
            }
        }
    }
}
