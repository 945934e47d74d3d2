//! vacancybot - hh.ru vacancy analytics in Telegram
//!
//! Collects vacancies from the hh.ru API into a JSON snapshot and answers
//! salary and skill questions about it through a Telegram bot, with
//! generated chart images.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (network, config, unreadable snapshot, etc.)

mod analysis;
mod bot;
mod cli;
mod collector;
mod config;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::{Args, Command};
use config::{Config, CONFIG_FILE_NAME};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Load configuration
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Validate the merged configuration
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(&args, &config);

    info!("vacancybot v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match &args.command {
        Command::Collect(_) => run_collect(&config, args.quiet).await,
        Command::Bot(_) => run_bot(&config).await,
        Command::Ask(_) => run_ask(&config, &args.ask_text().unwrap_or_default()),
        Command::InitConfig => Ok(()),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .vacancybot.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the search, bot and chart settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Fetch vacancies from hh.ru and write the snapshot.
async fn run_collect(config: &Config, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    let data_file = &config.general.data_file;

    if !quiet {
        println!(
            "📥 Collecting vacancies for '{}' ({} pages max)",
            config.collector.keyword, config.collector.pages
        );
    }

    let client = collector::HeadHunterClient::new(config.collector.clone())?;
    let vacancies = client.collect(!quiet).await?;

    if vacancies.is_empty() {
        warn!("No vacancies found for '{}'", config.collector.keyword);
    }

    store::save(data_file, &vacancies)?;

    if !quiet {
        let with_salary = vacancies
            .iter()
            .filter(|v| !v.salary_values().is_empty())
            .count();
        println!("\n📊 Collection Summary:");
        println!("   Vacancies: {}", vacancies.len());
        println!("   With salary ({}): {}", config.collector.currency, with_salary);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Snapshot saved to: {}", data_file.display());
    }

    Ok(())
}

/// Build the dispatcher over the configured snapshot.
fn load_dispatcher(config: &Config) -> Result<bot::Dispatcher> {
    let data_file = &config.general.data_file;
    let vacancies = store::load(data_file)
        .with_context(|| "Run `vacancybot collect` first to create the snapshot".to_string())?;

    let renderer = report::ChartRenderer::new(&config.charts).with_system_fonts();

    Ok(bot::Dispatcher::new(
        vacancies,
        config.analytics.clone(),
        renderer,
        store::snapshot_time(data_file),
    ))
}

/// Serve the snapshot over Telegram until interrupted.
async fn run_bot(config: &Config) -> Result<()> {
    let token = config
        .bot
        .token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .context("No bot token: pass --token, set TELEGRAM_BOT_TOKEN or bot.token in the config")?;

    let dispatcher = load_dispatcher(config)?;
    let client =
        bot::TelegramClient::new(&config.bot.api_url, token, config.bot.poll_timeout_seconds)?;

    bot::telegram::run_polling(&client, &dispatcher, &config.bot).await
}

/// Answer one command locally, printing text and writing any chart.
fn run_ask(config: &Config, text: &str) -> Result<()> {
    let dispatcher = load_dispatcher(config)?;

    let reply = dispatcher
        .handle(text)
        .with_context(|| format!("Not a bot command: {}", text))?;

    println!("{}", reply.text.trim_end());

    if let Some(chart) = reply.chart {
        let path = chart.write_png(dispatcher.renderer(), &config.charts.output_dir)?;
        println!("\n🖼️  Chart saved to: {}", path.display());
    }

    Ok(())
}
