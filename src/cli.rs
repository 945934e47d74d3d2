//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vacancybot - hh.ru vacancy analytics in Telegram
///
/// Collect vacancies from hh.ru into a JSON snapshot, then answer salary
/// and skill questions about it through a Telegram bot or from the terminal.
///
/// Examples:
///   vacancybot collect --keyword "Информационная безопасность" --pages 3
///   vacancybot bot --token 123456:ABC
///   vacancybot ask /vacancy Python Developer
///   vacancybot ask /top_skills --chart-dir charts
///   vacancybot init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .vacancybot.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Vacancy snapshot to write (collect) or read (bot, ask)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub data: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch vacancies from hh.ru and save them as a JSON snapshot
    Collect(CollectArgs),

    /// Serve analytics over the Telegram Bot API (long polling)
    Bot(BotArgs),

    /// Run a single bot command locally and print the reply
    Ask(AskArgs),

    /// Generate a default .vacancybot.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// Search text sent to hh.ru
    #[arg(short, long, value_name = "TEXT")]
    pub keyword: Option<String>,

    /// Maximum number of result pages to fetch
    #[arg(short, long, value_name = "COUNT")]
    pub pages: Option<u32>,

    /// hh.ru region id (1 = Moscow)
    #[arg(long, value_name = "ID")]
    pub area: Option<u32>,

    /// Results per page (1-100)
    #[arg(long, value_name = "COUNT")]
    pub per_page: Option<u32>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BotArgs {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AskArgs {
    /// Directory for generated chart images
    #[arg(long, value_name = "DIR")]
    pub chart_dir: Option<PathBuf>,

    /// Bot command and its arguments, e.g. /vacancy Python Developer
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub message: Vec<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Collect(collect) => {
                if let Some(ref keyword) = collect.keyword {
                    if keyword.trim().is_empty() {
                        return Err("Keyword must not be empty".to_string());
                    }
                }
                if collect.pages == Some(0) {
                    return Err("Pages must be at least 1".to_string());
                }
                if collect.area == Some(0) {
                    return Err("Area must be a positive hh.ru region id".to_string());
                }
                if let Some(per_page) = collect.per_page {
                    if !(1..=100).contains(&per_page) {
                        return Err("Per-page must be between 1 and 100".to_string());
                    }
                }
            }
            Command::Bot(bot) => {
                if let Some(ref token) = bot.token {
                    if token.trim().is_empty() || token.contains(char::is_whitespace) {
                        return Err("Bot token must be a non-empty string without spaces".to_string());
                    }
                }
            }
            Command::Ask(ask) => {
                let first = ask.message.first().map(String::as_str).unwrap_or("");
                if !first.starts_with('/') {
                    return Err(format!(
                        "Command must start with '/', e.g. /vacancy Python (got '{}')",
                        first
                    ));
                }
                if let Some(ref dir) = ask.chart_dir {
                    if dir.exists() && !dir.is_dir() {
                        return Err(format!("Chart path is not a directory: {}", dir.display()));
                    }
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The `ask` command line joined back into chat message text.
    pub fn ask_text(&self) -> Option<String> {
        match &self.command {
            Command::Ask(ask) => Some(ask.message.join(" ")),
            _ => None,
        }
    }
}
