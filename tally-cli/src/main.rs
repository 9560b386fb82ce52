use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

use tally_core::Source;

mod advice;
mod collaborators;
mod commands;
mod config;
mod context;
mod state;

use context::AppContext;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Turn receipts, chat messages and voice notes into expense records"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract an expense from a receipt image (via OCR) or its text
    Receipt {
        file: PathBuf,

        /// FILE already holds the recognized text; skip OCR
        #[arg(long)]
        text: bool,

        /// Validate and store the result
        #[arg(long)]
        save: bool,
    },

    /// Extract an expense from a chat message, e.g. "ate burger at KFC for 500 rs"
    Chat {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long)]
        save: bool,
    },

    /// Transcribe a voice note and extract an expense from it
    Voice {
        audio: PathBuf,

        #[arg(long)]
        save: bool,
    },

    /// Resolve a phrase like "last month" to a date range
    Range {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Answer "how much did I spend on food last week" from stored expenses
    Spend {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Print every stored expense
    List,

    /// Reports over stored expenses
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Ask for spending advice; reads questions from stdin when none is given
    Ask { question: Vec<String> },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Totals for one month (YYYY-MM)
    Summary { month: String },

    /// Per-category totals and weekly trend
    Insights,

    /// Linear forecast of next month's total
    Forecast,

    /// What can still be spent per day this month
    DailyLimit {
        /// Monthly budget (defaults to budget.monthly from config)
        #[arg(long)]
        budget: Option<f64>,
    },

    /// (date, amount) points in date order
    Graph,

    /// Write all expenses to a CSV file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_tracing(&cfg.log.level);

    let command = match cli.command {
        Command::Config { command } => return run_config(command, &cfg),
        other => other,
    };

    let ctx = AppContext::open(cfg)?;

    match command {
        Command::Receipt { file, text, save } => {
            print_json(&commands::receipt(&ctx, &file, text, save).await?)?;
        }

        Command::Chat { text, save } => {
            print_json(&commands::chat(&ctx, &text.join(" "), Source::Chat, save)?)?;
        }

        Command::Voice { audio, save } => {
            print_json(&commands::voice(&ctx, &audio, save).await?)?;
        }

        Command::Range { query } => {
            print_json(&commands::range(&ctx, &query.join(" ")))?;
        }

        Command::Spend { query } => {
            print_json(&commands::spend(&ctx, &query.join(" "))?)?;
        }

        Command::List => {
            print_json(&commands::list(&ctx)?)?;
        }

        Command::Report { command } => match command {
            ReportCommand::Summary { month } => print_json(&commands::summary(&ctx, &month)?)?,
            ReportCommand::Insights => print_json(&commands::report_insights(&ctx)?)?,
            ReportCommand::Forecast => print_json(&commands::forecast(&ctx)?)?,
            ReportCommand::DailyLimit { budget } => print_json(&commands::limit(&ctx, budget)?)?,
            ReportCommand::Graph => print_json(&commands::graph(&ctx)?)?,
            ReportCommand::Export { out } => print_json(&commands::export(&ctx, &out)?)?,
        },

        Command::Ask { question } => {
            if question.is_empty() {
                ask_loop(&ctx).await?;
            } else {
                print_json(&commands::ask(&ctx, &question.join(" ")).await?)?;
            }
        }

        Command::Config { .. } => {}
    }

    Ok(())
}

fn run_config(command: ConfigCommand, cfg: &config::Config) -> Result<()> {
    match command {
        ConfigCommand::Init => config::init_config(),
        ConfigCommand::Show => {
            println!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
            Ok(())
        }
    }
}

/// One question per line until EOF or "exit".
async fn ask_loop(ctx: &AppContext) -> Result<()> {
    eprintln!("Ask about your spending (\"exit\" to quit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        let q = line.trim();
        if q.is_empty() {
            continue;
        }
        if q.eq_ignore_ascii_case("exit") || q.eq_ignore_ascii_case("quit") {
            break;
        }
        match commands::ask(ctx, q).await {
            Ok(out) => print_json(&out)?,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
    Ok(())
}
