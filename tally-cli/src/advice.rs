use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::debug;

use tally_core::Expense;
use tally_report::summary::category_totals;

use crate::collaborators::{CollaboratorError, WorkerPool};
use crate::config::LlmSection;

const SYSTEM_PROMPT: &str = "You are a personal finance assistant. Amounts are in Pakistani rupees (Rs). \
Answer briefly using the spending data provided. Do not invent expenses that are not listed.";

/// Something that can turn a system + user prompt into a reply.
pub trait ChatBackend: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> impl Future<Output = Result<String>> + Send;
}

/// OpenAI-compatible `/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    cfg: LlmSection,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(cfg: LlmSection) -> Self {
        Self {
            cfg,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }
}

impl ChatBackend for OpenAiBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let key = std::env::var(&self.cfg.api_key_env)
            .with_context(|| format!("missing API key; set {}", self.cfg.api_key_env))?;

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.cfg.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.cfg.temperature,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .context("llm request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("llm error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse llm response")?;
        let text = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }
}

/// Answers questions about spending, caching replies per question and data.
pub struct Advisor<B> {
    backend: B,
    timeout: Duration,
    cache: DashMap<u64, String>,
}

impl<B: ChatBackend> Advisor<B> {
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            cache: DashMap::new(),
        }
    }

    pub async fn ask(&self, pool: &WorkerPool, question: &str, expenses: &[Expense]) -> Result<String> {
        let context = spending_context(expenses);
        let key = cache_key(question, &context);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key, "advice cache hit");
            return Ok(hit.clone());
        }

        let user = format!("{context}\nQuestion: {}", question.trim());
        let reply = pool
            .run("llm", self.timeout, async {
                self.backend
                    .complete(SYSTEM_PROMPT, &user)
                    .await
                    .map_err(|e| CollaboratorError::Failed {
                        what: "llm".to_string(),
                        message: format!("{e:#}"),
                    })
            })
            .await?;

        self.cache.insert(key, reply.clone());
        Ok(reply)
    }
}

/// Hash of the normalized question and the data the answer was based on.
pub fn cache_key(question: &str, context: &str) -> u64 {
    let normalized = question.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut h = DefaultHasher::new();
    normalized.hash(&mut h);
    context.hash(&mut h);
    h.finish()
}

fn spending_context(expenses: &[Expense]) -> String {
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let mut s = format!("Recorded expenses: {} totalling Rs.{total:.2}\n", expenses.len());
    for (cat, amount) in category_totals(expenses) {
        s.push_str(&format!("- {cat}: Rs.{amount:.2}\n"));
    }
    for e in expenses.iter().rev().take(20) {
        s.push_str(&format!("{} {} Rs.{:.2} ({})\n", e.date, e.title, e.amount, e.category));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tally_core::Category;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl ChatBackend for Counting {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("reply {n}: {}", user.lines().last().unwrap_or_default()))
        }
    }

    fn tea() -> Expense {
        Expense::manual("t", "Tea", 120.0, Category::Food, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap())
    }

    #[test]
    fn test_cache_key_ignores_case_and_spacing() {
        assert_eq!(cache_key("Can I save  more?", "ctx"), cache_key("can i save more?", "ctx"));
        assert_ne!(cache_key("can i save more?", "ctx"), cache_key("can i save more?", "other"));
    }

    #[tokio::test]
    async fn test_repeat_question_hits_cache() {
        let advisor = Advisor::new(Counting::default(), Duration::from_secs(1));
        let pool = WorkerPool::new(1);
        let data = vec![tea()];

        let a = advisor.ask(&pool, "How am I doing?", &data).await.unwrap();
        let b = advisor.ask(&pool, "how am i doing?", &data).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(advisor.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_data_misses_cache() {
        let advisor = Advisor::new(Counting::default(), Duration::from_secs(1));
        let pool = WorkerPool::new(1);

        advisor.ask(&pool, "How am I doing?", &[]).await.unwrap();
        advisor.ask(&pool, "How am I doing?", &[tea()]).await.unwrap();
        assert_eq!(advisor.backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(advisor.cache.len(), 2);
    }

    #[test]
    fn test_context_lists_categories() {
        let ctx = spending_context(&[tea()]);
        assert!(ctx.contains("Recorded expenses: 1 totalling Rs.120.00"));
        assert!(ctx.contains("- Food: Rs.120.00"));
    }
}
