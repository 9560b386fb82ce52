use chrono::{NaiveDate, NaiveDateTime};
use tally_core::{Category, Expense, ExpenseQuery, KeywordClassifier, Source};
use tally_extract::{ChatExpenseParser, ReceiptParser};
use tally_report::{ExpenseStore, MemoryStore, answer_query, daily_limit, forecast_next_month, insights, monthly_summary};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap().and_hms_opt(20, 0, 0).unwrap()
}

/// Messages a family might send over a few weeks, in order.
const MESSAGES: &[&str] = &[
    "ate biryani for 650 rs at Student Biryani on 2nd September",
    "paid electricity bill 8,400 rs on 10/09/2026",
    "careem to office 450 on 15 sep",
    "bought shoes from Daraz for 3,200 rs on 1 october",
    "netflix subscription rs 1100 on 3 october",
    "yesterday had tea for 120 rs",
];

fn load() -> MemoryStore {
    let parser = ChatExpenseParser::default();
    let store = MemoryStore::new();
    for (i, m) in MESSAGES.iter().enumerate() {
        let parsed = parser.parse(m, now(), Source::Chat).unwrap();
        let expense = Expense::from_candidate(parsed.candidate, format!("chat-{i}")).unwrap();
        store.put(expense).unwrap();
    }
    store
}

#[test]
fn test_chat_messages_land_in_expected_categories() {
    let all = load().all().unwrap();
    let cats: Vec<Category> = all.iter().map(|e| e.category).collect();
    assert_eq!(
        cats,
        vec![
            Category::Food,
            Category::Bills,
            Category::Transport,
            Category::Shopping,
            Category::Entertainment,
            Category::Food,
        ]
    );
}

#[test]
fn test_september_summary() {
    let all = load().all().unwrap();
    let s = monthly_summary(&all, "2026-09").unwrap();
    assert_eq!(s.count, 3);
    assert_eq!(s.total, 650.0 + 8400.0 + 450.0);
    assert_eq!(s.highest.unwrap().amount, 8400.0);
}

#[test]
fn test_question_answered_from_store() {
    let store = load();
    let q = ExpenseQuery::parse("how much food last month?", now().date(), &KeywordClassifier::default());
    let hits = store.query(&q).unwrap();
    assert_eq!(hits.len(), 1);
    let a = answer_query(&store.all().unwrap(), q);
    assert_eq!(a.total, 650.0);
}

#[test]
fn test_insights_and_forecast() {
    let all = load().all().unwrap();
    let i = insights(&all);
    assert_eq!(i.by_category[0].category, Category::Bills);
    let f = forecast_next_month(&all);
    assert_eq!(f.months_used, 2);
    // Sep 9500, Oct 4420 -> line continues down
    assert_eq!(f.forecast, -660.0);
}

#[test]
fn test_daily_limit_from_october() {
    let all = load().all().unwrap();
    let l = daily_limit(&all, 20_000.0, now().date());
    assert_eq!(l.remaining_budget, 20_000.0 - 4420.0);
    assert_eq!(l.remaining_days, 16);
}

#[test]
fn test_unreadable_receipt_never_reaches_store() {
    let p = ReceiptParser::default().parse("blurry", now().date());
    assert!(Expense::from_candidate(p.candidate, "r1").is_err());
}
