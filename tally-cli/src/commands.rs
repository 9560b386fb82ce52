//! Command handlers. Each returns something serializable; `main` prints it.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use tally_core::{DateRange, Expense, ExpenseQuery, Source, new_expense_id, resolve_date_range};
use tally_extract::{ChatParse, ParsedDetails, ReceiptParse};
use tally_report::export::write_csv;
use tally_report::{
    DailyLimit, Forecast, GraphPoint, Insights, MonthlySummary, SpendingAnswer, answer_query, daily_limit,
    forecast_next_month, graph_points, insights, monthly_summary,
};

use crate::collaborators::recognize_file;
use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct ReceiptOutput {
    #[serde(flatten)]
    pub parse: ReceiptParse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<Expense>,
}

#[derive(Debug, Serialize)]
pub struct ChatOutput {
    pub candidate: tally_core::ParsedExpenseCandidate,
    pub details: ParsedDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<Expense>,
}

#[derive(Debug, Serialize)]
pub struct RangeOutput {
    pub query: String,
    pub range: Option<DateRange>,
}

#[derive(Debug, Serialize)]
pub struct SpendOutput {
    #[serde(flatten)]
    pub answer: SpendingAnswer,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: MonthlySummary,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExportOutput {
    pub path: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AdviceOutput {
    pub question: String,
    pub answer: String,
}

/// `--text` treats the file as already-recognized receipt text.
pub async fn receipt(ctx: &AppContext, file: &Path, as_text: bool, save: bool) -> Result<ReceiptOutput> {
    if !file.exists() {
        bail!("file not found: {}", file.display());
    }
    let text = if as_text {
        fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?
    } else {
        recognize_file(&ctx.pool, &ctx.ocr(), file).await?
    };
    receipt_from_text(ctx, &text, save)
}

pub fn receipt_from_text(ctx: &AppContext, text: &str, save: bool) -> Result<ReceiptOutput> {
    let parse = ctx.receipt_parser().parse(text, ctx.today());
    let saved = if save {
        Some(persist(ctx, &parse.candidate).context("receipt not saved")?)
    } else {
        None
    };
    Ok(ReceiptOutput { parse, saved })
}

pub fn chat(ctx: &AppContext, text: &str, source: Source, save: bool) -> Result<ChatOutput> {
    let parse: ChatParse = ctx.chat_parser().parse(text, ctx.now(), source)?;
    let saved = if save {
        Some(persist(ctx, &parse.candidate)?)
    } else {
        None
    };
    Ok(ChatOutput {
        details: parse.details(),
        candidate: parse.candidate,
        saved,
    })
}

/// Speech-to-text, then the chat parser with `source = voice`.
pub async fn voice(ctx: &AppContext, audio: &Path, save: bool) -> Result<ChatOutput> {
    if !audio.exists() {
        bail!("file not found: {}", audio.display());
    }
    let transcript = recognize_file(&ctx.pool, &ctx.speech(), audio).await?;
    chat(ctx, &transcript, Source::Voice, save)
}

fn persist(ctx: &AppContext, candidate: &tally_core::ParsedExpenseCandidate) -> Result<Expense> {
    let expense = Expense::from_candidate(candidate.clone(), new_expense_id())?;
    ctx.store.put(expense.clone())?;
    info!(id = %expense.id, amount = expense.amount, category = %expense.category, "expense saved");
    Ok(expense)
}

pub fn range(ctx: &AppContext, query: &str) -> RangeOutput {
    RangeOutput {
        query: query.to_string(),
        range: resolve_date_range(query, ctx.today()),
    }
}

pub fn spend(ctx: &AppContext, query: &str) -> Result<SpendOutput> {
    let q = ExpenseQuery::parse(query, ctx.today(), &ctx.classifier);
    let answer = answer_query(&ctx.store.all()?, q);
    Ok(SpendOutput {
        text: answer.to_text(),
        answer,
    })
}

pub fn list(ctx: &AppContext) -> Result<Vec<Expense>> {
    Ok(ctx.store.all()?)
}

pub fn summary(ctx: &AppContext, month: &str) -> Result<SummaryOutput> {
    let summary = monthly_summary(&ctx.store.all()?, month)?;
    Ok(SummaryOutput {
        text: summary.to_text(),
        summary,
    })
}

pub fn report_insights(ctx: &AppContext) -> Result<Insights> {
    Ok(insights(&ctx.store.all()?))
}

pub fn forecast(ctx: &AppContext) -> Result<Forecast> {
    Ok(forecast_next_month(&ctx.store.all()?))
}

pub fn limit(ctx: &AppContext, budget: Option<f64>) -> Result<DailyLimit> {
    let budget = budget.unwrap_or(ctx.config.budget.monthly);
    Ok(daily_limit(&ctx.store.all()?, budget, ctx.today()))
}

pub fn graph(ctx: &AppContext) -> Result<Vec<GraphPoint>> {
    Ok(graph_points(&ctx.store.all()?))
}

pub fn export(ctx: &AppContext, out: &Path) -> Result<ExportOutput> {
    let expenses = ctx.store.all()?;
    let file = fs::File::create(out).with_context(|| format!("create {}", out.display()))?;
    write_csv(&expenses, file)?;
    info!(count = expenses.len(), path = %out.display(), "exported expenses");
    Ok(ExportOutput {
        path: out.display().to_string(),
        count: expenses.len(),
    })
}

pub async fn ask(ctx: &AppContext, question: &str) -> Result<AdviceOutput> {
    let answer = ctx.advisor.ask(&ctx.pool, question, &ctx.store.all()?).await?;
    Ok(AdviceOutput {
        question: question.to_string(),
        answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tally_core::{Category, ParseError};
    use tally_report::MemoryStore;

    use crate::config::Config;

    fn ctx() -> AppContext {
        AppContext::new(Config::default(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_chat_save_persists() {
        let ctx = ctx();
        let out = chat(&ctx, "ate burger at KFC for 500 rs", Source::Chat, true).unwrap();
        assert_eq!(out.details.amount, 500.0);
        let saved = out.saved.unwrap();
        assert_eq!(saved.category, Category::Food);
        assert_eq!(ctx.store.get(&saved.id).unwrap(), Some(saved));
    }

    #[test]
    fn test_date_order_from_config() {
        let mut cfg = Config::default();
        cfg.general.date_order = tally_extract::DateOrder::MonthDayYear;
        let ctx = AppContext::new(cfg, Arc::new(MemoryStore::new())).unwrap();
        let out = chat(&ctx, "fuel 3000 on 03/04/2026", Source::Chat, false).unwrap();
        assert_eq!(out.candidate.date, chrono::NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    }

    #[test]
    fn test_chat_without_amount_errors() {
        let ctx = ctx();
        let err = chat(&ctx, "had lunch with friends", Source::Chat, false).unwrap_err();
        assert_eq!(err.to_string(), "Could not detect amount");
        assert_eq!(err.downcast_ref::<ParseError>(), Some(&ParseError::AmountNotFound));
    }

    #[test]
    fn test_zero_amount_receipt_not_saved() {
        let ctx = ctx();
        let err = receipt_from_text(&ctx, "Thank you\nplease come again", true).unwrap_err();
        assert_eq!(err.to_string(), "receipt not saved");
        assert!(ctx.store.all().unwrap().is_empty());
    }

    #[test]
    fn test_receipt_uses_shopping_default() {
        let ctx = ctx();
        let out = receipt_from_text(&ctx, "ACME STORE\nTotal: 1,250.00", false).unwrap();
        assert_eq!(out.parse.candidate.amount, 1250.0);
        assert_eq!(out.parse.candidate.category, Category::Shopping);
        assert!(out.saved.is_none());
    }

    #[test]
    fn test_spend_reads_from_store() {
        let ctx = ctx();
        chat(&ctx, "had tea for 120 rs today", Source::Chat, true).unwrap();
        chat(&ctx, "uber ride 300 rs today", Source::Chat, true).unwrap();
        let out = spend(&ctx, "how much on food today").unwrap();
        assert_eq!(out.answer.total, 120.0);
        assert_eq!(out.answer.count, 1);
    }

    #[test]
    fn test_chat_output_json_shape() {
        let ctx = ctx();
        let out = chat(&ctx, "paid 1500 rs electricity bill", Source::Chat, false).unwrap();
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["details"]["category"], "Bills");
        assert_eq!(v["candidate"]["source"], "chat");
        assert!(v.get("saved").is_none());
    }
}
