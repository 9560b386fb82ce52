//! Receipt OCR text -> expense candidate.
//!
//! Amount: labeled totals, then the largest decimal price, then the
//! largest bare number, each tier with its own plausibility range.
//! Date: labeled or bare D-M-Y / D-Month-Y, falling back to today.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

use tally_core::{Classify, KeywordClassifier, ParsedExpenseCandidate, Source};

use crate::chain::{Strategy, first_match};
use crate::text::{first_non_blank_line, parse_amount};

pub const DEFAULT_TITLE: &str = "Auto Expense";

/// Which tier of the amount chain produced the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountTier {
    LabeledTotal,
    LargestPrice,
    LargestNumber,
}

pub const AMOUNT_CHAIN: [Strategy<AmountTier, f64>; 3] = [
    Strategy::new(AmountTier::LabeledTotal, labeled_total),
    Strategy::new(AmountTier::LargestPrice, largest_price),
    Strategy::new(AmountTier::LargestNumber, largest_number),
];

/// Receipt parse plus diagnostics about how it was reached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptParse {
    pub candidate: ParsedExpenseCandidate,
    pub amount_tier: Option<AmountTier>,
    /// The matched date text, if any pattern hit
    pub date_text: Option<String>,
}

pub struct ReceiptParser<C = KeywordClassifier> {
    classifier: C,
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new(KeywordClassifier::default().with_default(tally_core::Category::Shopping))
    }
}

impl<C: Classify> ReceiptParser<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Never fails: missing pieces degrade to defaults.
    pub fn parse(&self, text: &str, today: NaiveDate) -> ReceiptParse {
        let title = first_non_blank_line(text).unwrap_or(DEFAULT_TITLE);

        let (amount_tier, amount) = match first_match(&AMOUNT_CHAIN, text) {
            Some((tier, v)) => {
                debug!(?tier, amount = v, "receipt amount found");
                (Some(tier), v)
            }
            None => {
                warn!("no amount found in receipt text");
                (None, 0.0)
            }
        };

        let date_text = find_date_text(text);
        let date = date_text
            .as_deref()
            .and_then(parse_receipt_date)
            .unwrap_or(today);

        // OCR bodies are full of words like "date" that trip keyword matching,
        // so only the header line is classified.
        let category = self.classifier.classify(title);

        ReceiptParse {
            candidate: ParsedExpenseCandidate::new(title, amount, category, date, text, Source::Receipt),
            amount_tier,
            date_text,
        }
    }
}

fn labeled_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            r"(?i)\b(?:net\s+total|total\s+amount|amount\s+payable|grand\s+total|total\s+payable|total)\s*[:|]?\s*[^\d]*(\d[\d,]*(?:\.\d{1,2})?)",
            r"(?m)^\s*\|(?:[^|\n]*\|){3,}[^|\n\d]*(\d[\d,]*\.\d{2})\s*\|\s*$",
            r"(?m)(\d[\d,]*\.\d{2})\s*$",
            r"(?i)total.*?(\d+\.\d{2})",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid total regex"))
        .collect()
    })
}

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:,\d{3})*\.\d{2}|\d+\.\d{2}").expect("invalid price regex"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:,\d{3})*(?:\.\d{2})?").expect("invalid number regex"))
}

/// Tier 1: every labeled pattern in order, every match in document order;
/// the first value in (0, 100000) wins.
///
/// Departure from plain document order: a match whose label is preceded by
/// "sub" ("Sub Total", "SUB-TOTAL") is skipped, so a subtotal printed above
/// the real total does not win.
pub fn labeled_total(text: &str) -> Option<f64> {
    labeled_patterns().iter().find_map(|re| {
        re.captures_iter(text)
            .filter(|caps| !is_subtotal_label(text, caps.get(0).map_or(0, |m| m.start())))
            .filter_map(|caps| parse_amount(caps.get(1)?.as_str()))
            .find(|v| *v > 0.0 && *v < 100_000.0)
    })
}

fn is_subtotal_label(text: &str, start: usize) -> bool {
    let label_starts_here = text[start..].starts_with(|c: char| c.is_alphabetic());
    let before = text[..start].trim_end_matches([' ', '\t', '-']);
    label_starts_here
        && before.len() >= 3
        && before.is_char_boundary(before.len() - 3)
        && before[before.len() - 3..].eq_ignore_ascii_case("sub")
}

/// Tier 2: largest decimal price in [1, 10000]
pub fn largest_price(text: &str) -> Option<f64> {
    max_in_range(price_re(), text, 1.0, 10_000.0)
}

/// Tier 3: largest number of any shape in [10, 10000]
pub fn largest_number(text: &str) -> Option<f64> {
    max_in_range(number_re(), text, 10.0, 10_000.0)
}

fn max_in_range(re: &Regex, text: &str, lo: f64, hi: f64) -> Option<f64> {
    re.find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .filter(|v| (lo..=hi).contains(v))
        .reduce(f64::max)
}

fn date_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            r"(?i)date[^\d]*\b(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})\b",
            r"(?i)date[^\d]*\b(\d{1,2}[-/ ][a-z]{3,}[-/ ]\d{2,4})\b",
            r"\b(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})\b",
            r"(?i)\b(\d{1,2}[-/ ][a-z]{3,}[-/ ]\d{2,4})\b",
            r"\b(\d{4}-\d{2}-\d{2})\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid date regex"))
        .collect()
    })
}

/// Accepted layouts, tried in this order.
pub const RECEIPT_DATE_FORMATS: [&str; 6] = ["%d-%b-%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d %b %Y", "%Y-%m-%d"];

/// First date-looking substring, by pattern priority
pub fn find_date_text(text: &str) -> Option<String> {
    date_patterns()
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

/// Parse a matched date string against [`RECEIPT_DATE_FORMATS`].
pub fn parse_receipt_date(s: &str) -> Option<NaiveDate> {
    let s = expand_two_digit_year(s.trim());
    RECEIPT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
}

/// "25-12-24" -> "25-12-2024", "7/3/25" -> "7/3/2025". Year-first
/// strings are left alone.
fn expand_two_digit_year(s: &str) -> String {
    let year_first = s.split(['-', '/', '.', ' ']).next().is_some_and(|head| head.len() == 4);
    match s.rfind(['-', '/', '.', ' ']) {
        Some(idx) if !year_first => {
            let year = &s[idx + 1..];
            if year.len() == 2 && year.chars().all(|c| c.is_ascii_digit()) {
                return format!("{}20{}", &s[..=idx], year);
            }
            s.to_string()
        }
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Category;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn parse(text: &str) -> ReceiptParse {
        ReceiptParser::default().parse(text, today())
    }

    #[test]
    fn test_labeled_total_with_thousands() {
        let p = parse("METRO CASH & CARRY\nItem A 200.00\nTotal: 1,234.56\nThank you");
        assert_eq!(p.candidate.amount, 1234.56);
        assert_eq!(p.amount_tier, Some(AmountTier::LabeledTotal));
        assert_eq!(p.candidate.title, "METRO CASH & CARRY");
    }

    #[test]
    fn test_grand_total_beats_subtotal() {
        let p = parse("Shop\nSubtotal 900\nGrand Total 1,050");
        assert_eq!(p.candidate.amount, 1050.0);
    }

    #[test]
    fn test_implausible_labeled_value_is_skipped() {
        // 250000 is outside (0, 100000): the next match in document order wins
        let p = parse("Store\nTotal 250000\nTotal Payable 2,500.00");
        assert_eq!(p.candidate.amount, 2500.0);
    }

    #[test]
    fn test_sub_total_is_not_the_total() {
        assert_eq!(labeled_total("Sub Total 900.00\nNet Total 1,044.00"), Some(1044.0));
        assert_eq!(labeled_total("SUB-TOTAL 900.00\nTOTAL 1,044.00"), Some(1044.0));
    }

    #[test]
    fn test_tabular_row() {
        assert_eq!(labeled_total("| Burger | 2 | 350.00 | 700.00 |"), Some(700.0));
    }

    #[test]
    fn test_line_end_decimal() {
        assert_eq!(labeled_total("Cafe\nLatte   450.50\nMuffin 120.00\n"), Some(450.5));
    }

    #[test]
    fn test_largest_price_tier() {
        assert_eq!(largest_price("a 12.50 b 1,999.99 c 20000.00"), Some(1999.99));
        assert_eq!(largest_price("0.50 only"), None);
    }

    #[test]
    fn test_largest_number_tier() {
        let p = parse("BAKERY\nbread 120 eggs 300 qty 2");
        assert_eq!(p.candidate.amount, 300.0);
        assert_eq!(p.amount_tier, Some(AmountTier::LargestNumber));
        assert!(p.candidate.amount <= 10_000.0);
    }

    #[test]
    fn test_no_numbers_means_zero() {
        let p = parse("Thank you for shopping\nCome again");
        assert_eq!(p.candidate.amount, 0.0);
        assert_eq!(p.amount_tier, None);
        assert_eq!(p.candidate.date, today());
    }

    #[test]
    fn test_empty_text_placeholder_title() {
        let p = parse("   \n\n");
        assert_eq!(p.candidate.title, DEFAULT_TITLE);
        assert_eq!(p.candidate.amount, 0.0);
        assert_eq!(p.candidate.category, Category::Shopping);
    }

    #[test]
    fn test_labeled_numeric_date() {
        let p = parse("Shop\nDate: 25-12-2024\nTotal 100.00");
        assert_eq!(p.candidate.date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(p.date_text.as_deref(), Some("25-12-2024"));
    }

    #[test]
    fn test_month_name_date() {
        let p = parse("Shop\nDate 03-Jan-2025\nTotal 100.00");
        assert_eq!(p.candidate.date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }

    #[test]
    fn test_space_month_date_and_dots() {
        assert_eq!(parse_receipt_date("7 Mar 2025"), NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(parse_receipt_date("07.03.2025"), NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(parse_receipt_date("07/03/25"), NaiveDate::from_ymd_opt(2025, 3, 7));
    }

    #[test]
    fn test_short_day_month_two_digit_year() {
        assert_eq!(parse_receipt_date("7/3/25"), NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(parse_receipt_date("7-3-25"), NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(parse_receipt_date("2025-03-07"), NaiveDate::from_ymd_opt(2025, 3, 7));
        let p = parse("Shop\nDate: 7/3/25\nTotal 100.00");
        assert_eq!(p.candidate.date, NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
    }

    #[test]
    fn test_unlabeled_month_name_date() {
        let p = parse("Shop\n03 Jan 2025\nTotal 100.00");
        assert_eq!(p.date_text.as_deref(), Some("03 Jan 2025"));
        assert_eq!(p.candidate.date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(p.candidate.amount, 100.0);
    }

    #[test]
    fn test_unparseable_date_defaults_to_today() {
        // US order: matches the pattern but month 31 fails every format
        let p = parse("Shop\nDate: 12/31/2024\nTotal 100.00");
        assert_eq!(p.date_text.as_deref(), Some("12/31/2024"));
        assert_eq!(p.candidate.date, today());
    }

    #[test]
    fn test_title_category() {
        let p = parse("KFC Gulberg\nTotal 1,200.00");
        assert_eq!(p.candidate.category, Category::Food);
    }

    #[test]
    fn test_chain_order_is_fixed() {
        let keys: Vec<_> = AMOUNT_CHAIN.iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec![AmountTier::LabeledTotal, AmountTier::LargestPrice, AmountTier::LargestNumber]
        );
    }
}
