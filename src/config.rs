//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.vacancybot.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".vacancybot.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// hh.ru collector settings.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Analytics settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the vacancy snapshot.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            verbose: false,
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("vacancies.json")
}

/// Settings for fetching vacancies from hh.ru.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Vacancies endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Search text.
    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Region id (1 is Moscow).
    #[serde(default = "default_area")]
    pub area: u32,

    /// Results per page (the API caps this at 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Maximum number of pages to fetch.
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// User-Agent header; hh.ru rejects requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Only salaries in this currency are kept.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            keyword: default_keyword(),
            area: default_area(),
            per_page: default_per_page(),
            pages: default_pages(),
            user_agent: default_user_agent(),
            currency: default_currency(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.hh.ru/vacancies".to_string()
}

fn default_keyword() -> String {
    "Информационная безопасность".to_string()
}

fn default_area() -> u32 {
    1
}

fn default_per_page() -> u32 {
    100
}

fn default_pages() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("vacancybot/{}", env!("CARGO_PKG_VERSION"))
}

fn default_currency() -> String {
    "RUR".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API base URL.
    #[serde(default = "default_telegram_url")]
    pub api_url: String,

    /// Bot token. Usually supplied through `TELEGRAM_BOT_TOKEN` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,

    /// Pause after a failed poll before trying again.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            api_url: default_telegram_url(),
            token: None,
            poll_timeout_seconds: default_poll_timeout(),
            retry_delay_seconds: default_retry_delay(),
        }
    }
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    5
}

/// Ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Length of the salary and skill rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Titles containing any of these words are left out of the salary ranking.
    #[serde(default = "default_excluded_title_words")]
    pub excluded_title_words: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            excluded_title_words: default_excluded_title_words(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_excluded_title_words() -> Vec<String> {
    vec!["архитектор".to_string()]
}

/// Chart image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Image width in pixels.
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_chart_height")]
    pub height: u32,

    /// CSS font-family list used for all chart text.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Where `ask` writes chart images.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
            font_family: default_font_family(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    600
}

fn default_font_family() -> String {
    "DejaVu Sans, Arial, sans-serif".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_optional(Path::new(CONFIG_FILE_NAME))
    }

    fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        if let Some(ref data) = args.data {
            self.general.data_file = data.clone();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Command::Collect(collect) => {
                if let Some(ref keyword) = collect.keyword {
                    self.collector.keyword = keyword.clone();
                }
                if let Some(pages) = collect.pages {
                    self.collector.pages = pages;
                }
                if let Some(area) = collect.area {
                    self.collector.area = area;
                }
                if let Some(per_page) = collect.per_page {
                    self.collector.per_page = per_page;
                }
            }
            Command::Bot(bot) => {
                if let Some(ref token) = bot.token {
                    self.bot.token = Some(token.clone());
                }
            }
            Command::Ask(ask) => {
                if let Some(ref dir) = ask.chart_dir {
                    self.charts.output_dir = dir.clone();
                }
            }
            Command::InitConfig => {}
        }
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> Result<(), String> {
        validate_url("collector.api_url", &self.collector.api_url)?;
        validate_url("bot.api_url", &self.bot.api_url)?;

        let collector = &self.collector;
        if collector.keyword.trim().is_empty() {
            return Err("collector.keyword must not be empty".to_string());
        }
        if collector.area == 0 {
            return Err("collector.area must be a positive region id".to_string());
        }
        if collector.pages == 0 {
            return Err("collector.pages must be at least 1".to_string());
        }
        if !(1..=100).contains(&collector.per_page) {
            return Err("collector.per_page must be between 1 and 100".to_string());
        }
        if collector.timeout_seconds == 0 {
            return Err("collector.timeout_seconds must be at least 1".to_string());
        }

        if self.analytics.top_n == 0 {
            return Err("analytics.top_n must be at least 1".to_string());
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn validate_url(key: &str, url: &str) -> Result<(), String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("{} must start with 'http://' or 'https://'", key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, AskArgs, CollectArgs, Command};
    use tempfile::TempDir;

    fn make_args(command: Command) -> Args {
        Args {
            config: None,
            data: None,
            verbose: false,
            quiet: false,
            command,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.data_file, PathBuf::from("vacancies.json"));
        assert_eq!(config.collector.api_url, "https://api.hh.ru/vacancies");
        assert_eq!(config.collector.per_page, 100);
        assert_eq!(config.collector.area, 1);
        assert_eq!(config.analytics.top_n, 10);
        assert_eq!(config.analytics.excluded_title_words, vec!["архитектор"]);
        assert_eq!((config.charts.width, config.charts.height), (1200, 600));
        assert!(config.bot.token.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_file = "snapshots/it.json"
verbose = true

[collector]
keyword = "Rust"
pages = 5

[analytics]
top_n = 5
excluded_title_words = ["стажер", "lead"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_file, PathBuf::from("snapshots/it.json"));
        assert!(config.general.verbose);
        assert_eq!(config.collector.keyword, "Rust");
        assert_eq!(config.collector.pages, 5);
        assert_eq!(config.collector.per_page, 100);
        assert_eq!(config.analytics.top_n, 5);
        assert_eq!(config.analytics.excluded_title_words, vec!["стажер", "lead"]);
        assert_eq!(config.bot.poll_timeout_seconds, 30);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[collector]"));
        assert!(toml_str.contains("[bot]"));
        assert!(toml_str.contains("[analytics]"));
        assert!(toml_str.contains("[charts]"));
        assert!(!toml_str.contains("token"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.collector.keyword, "Информационная безопасность");
    }

    #[test]
    fn test_load_optional() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(Config::load_optional(&path).unwrap().is_none());

        std::fs::write(&path, "[bot]\nretry_delay_seconds = 1\n").unwrap();
        let config = Config::load_optional(&path).unwrap().unwrap();
        assert_eq!(config.bot.retry_delay_seconds, 1);

        std::fs::write(&path, "[bot\n").unwrap();
        assert!(Config::load_optional(&path).is_err());
    }

    #[test]
    fn test_merge_collect_args() {
        let mut config = Config::default();
        let args = make_args(Command::Collect(CollectArgs {
            keyword: Some("DevSecOps".to_string()),
            pages: Some(1),
            area: None,
            per_page: None,
        }));

        config.merge_with_args(&args);

        assert_eq!(config.collector.keyword, "DevSecOps");
        assert_eq!(config.collector.pages, 1);
        assert_eq!(config.collector.area, 1);
    }

    #[test]
    fn test_merge_global_args() {
        let mut config = Config::default();
        let mut args = make_args(Command::Ask(AskArgs {
            chart_dir: Some(PathBuf::from("out")),
            message: vec!["/top_skills".to_string()],
        }));
        args.data = Some(PathBuf::from("other.json"));
        args.verbose = true;

        config.merge_with_args(&args);

        assert_eq!(config.general.data_file, PathBuf::from("other.json"));
        assert!(config.general.verbose);
        assert_eq!(config.charts.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_file_values() {
        let config: Config = toml::from_str(
            r#"
[collector]
api_url = "ftp://example"
"#,
        )
        .unwrap();
        assert!(config.validate().unwrap_err().contains("collector.api_url"));

        let mut config = Config::default();
        config.bot.api_url = "api.telegram.org".to_string();
        assert!(config.validate().unwrap_err().contains("bot.api_url"));

        for (toml_content, key) in [
            ("[collector]\npages = 0\n", "collector.pages"),
            ("[collector]\nper_page = 101\n", "collector.per_page"),
            ("[collector]\ntimeout_seconds = 0\n", "collector.timeout_seconds"),
            ("[collector]\narea = 0\n", "collector.area"),
            ("[analytics]\ntop_n = 0\n", "analytics.top_n"),
        ] {
            let config: Config = toml::from_str(toml_content).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.contains(key), "{} -> {}", toml_content, err);
        }
    }

    #[test]
    fn test_cli_overrides_are_validated_after_merge() {
        let mut config: Config = toml::from_str("[collector]\npages = 0\n").unwrap();
        let args = make_args(Command::Collect(CollectArgs {
            keyword: None,
            pages: Some(2),
            area: None,
            per_page: None,
        }));

        config.merge_with_args(&args);

        assert!(config.validate().is_ok());
    }
}
