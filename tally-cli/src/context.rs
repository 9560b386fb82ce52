use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

use tally_core::KeywordClassifier;
use tally_core::time::{local_now, local_today, parse_timezone};
use tally_extract::{ChatExpenseParser, DateSettings, ReceiptParser};
use tally_report::{ExpenseStore, JsonFileStore};

use crate::advice::{Advisor, OpenAiBackend};
use crate::collaborators::{CommandRecognizer, WorkerPool};
use crate::config::Config;
use crate::state::expenses_path;

/// Everything a command needs, built once in `main`.
pub struct AppContext {
    pub config: Config,
    pub tz: Tz,
    pub store: Arc<dyn ExpenseStore>,
    pub classifier: KeywordClassifier,
    pub pool: WorkerPool,
    pub advisor: Advisor<OpenAiBackend>,
}

impl AppContext {
    pub fn new(config: Config, store: Arc<dyn ExpenseStore>) -> Result<Self> {
        let tz = parse_timezone(&config.general.timezone)?;
        let pool = WorkerPool::new(config.workers.max_concurrent);
        let advisor = Advisor::new(
            OpenAiBackend::new(config.llm.clone()),
            Duration::from_secs(config.llm.timeout_secs),
        );
        Ok(Self {
            config,
            tz,
            store,
            classifier: KeywordClassifier::default(),
            pool,
            advisor,
        })
    }

    /// Config plus the JSON-file store under the tally home.
    pub fn open(config: Config) -> Result<Self> {
        let path = expenses_path()?;
        let store = JsonFileStore::open(&path).with_context(|| format!("open {}", path.display()))?;
        Self::new(config, Arc::new(store))
    }

    pub fn now(&self) -> NaiveDateTime {
        local_now(self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        local_today(self.tz)
    }

    pub fn receipt_parser(&self) -> ReceiptParser {
        ReceiptParser::new(
            self.classifier
                .clone()
                .with_default(self.config.receipt.default_category),
        )
    }

    pub fn chat_parser(&self) -> ChatExpenseParser {
        ChatExpenseParser::new(self.classifier.clone()).with_date_settings(DateSettings {
            order: self.config.general.date_order,
            ..DateSettings::default()
        })
    }

    pub fn ocr(&self) -> CommandRecognizer {
        CommandRecognizer::new(self.config.ocr.clone())
    }

    pub fn speech(&self) -> CommandRecognizer {
        CommandRecognizer::new(self.config.speech.clone())
    }
}
