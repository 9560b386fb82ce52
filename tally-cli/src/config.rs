use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use tally_core::Category;
use tally_extract::DateOrder;

use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralSection,
    pub receipt: ReceiptSection,
    pub ocr: CommandSection,
    pub speech: CommandSection,
    pub llm: LlmSection,
    pub workers: WorkersSection,
    pub budget: BudgetSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// IANA name; "now" for every parser is taken in this zone
    pub timezone: String,
    /// How chat text like "03/04/2026" is read
    pub date_order: DateOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptSection {
    pub default_category: Category,
}

/// An external program that turns a media file into text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSection {
    pub command: String,
    /// `{input}` is replaced with the media path; if absent the path is appended
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// OpenAI-compatible endpoint root
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersSection {
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSection {
    pub monthly: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralSection::default(),
            receipt: ReceiptSection::default(),
            ocr: CommandSection::ocr(),
            speech: CommandSection::speech(),
            llm: LlmSection::default(),
            workers: WorkersSection::default(),
            budget: BudgetSection::default(),
            log: LogSection::default(),
        }
    }
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Karachi".to_string(),
            date_order: DateOrder::DayMonthYear,
        }
    }
}

impl Default for ReceiptSection {
    fn default() -> Self {
        Self {
            default_category: Category::Shopping,
        }
    }
}

impl CommandSection {
    pub fn ocr() -> Self {
        Self {
            command: "tesseract".to_string(),
            args: vec!["{input}".to_string(), "stdout".to_string()],
            timeout_secs: 60,
        }
    }

    pub fn speech() -> Self {
        Self {
            command: "whisper-cli".to_string(),
            args: vec!["-nt".to_string(), "-f".to_string(), "{input}".to_string()],
            timeout_secs: 120,
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.4,
            timeout_secs: 60,
        }
    }
}

impl Default for WorkersSection {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self { monthly: 50_000.0 }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse config.toml")
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Config::from_toml(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        eprintln!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    eprintln!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.general.timezone, "Asia/Karachi");
        assert_eq!(cfg.general.date_order, DateOrder::DayMonthYear);
        assert_eq!(cfg.receipt.default_category, Category::Shopping);
        assert_eq!(cfg.ocr, CommandSection::ocr());
        assert_eq!(cfg.speech, CommandSection::speech());
        assert_eq!(cfg.workers.max_concurrent, 2);
    }

    #[test]
    fn test_partial_sections() {
        let cfg = Config::from_toml(
            r#"
[general]
timezone = "Europe/London"
date_order = "month_day_year"

[receipt]
default_category = "other"

[budget]
monthly = 1200.5
"#,
        )
        .unwrap();
        assert_eq!(cfg.general.timezone, "Europe/London");
        assert_eq!(cfg.general.date_order, DateOrder::MonthDayYear);
        assert_eq!(cfg.receipt.default_category, Category::Other);
        assert_eq!(cfg.budget.monthly, 1200.5);
        assert_eq!(cfg.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_roundtrip_keeps_commands() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back = Config::from_toml(&s).unwrap();
        assert_eq!(back.speech.command, "whisper-cli");
        assert_eq!(back.ocr.args, vec!["{input}", "stdout"]);
    }
}
