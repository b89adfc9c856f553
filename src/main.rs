//! course-watch main entry point
//!
//! This is the command-line interface for the course catalog watcher.

use anyhow::Context;
use clap::Parser;
use course_watch::config::{config_fingerprint, load_config, validate, Config, Overrides};
use course_watch::crawler::run_watch;
use course_watch::notify::{StdoutNotifier, TelegramNotifier};
use course_watch::output::{load_statistics, print_statistics};
use course_watch::storage::open_storage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Number of courses listed by --stats
const RECENT_COURSES: usize = 10;

/// course-watch: announces new entries of a course catalog
///
/// Crawls the catalog politely, stores every course it finds in SQLite and
/// sends a Telegram message listing the courses it had not seen before.
#[derive(Parser, Debug)]
#[command(name = "course-watch")]
#[command(version)]
#[command(about = "Announces new courses of a course catalog", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long = "db", env = "DB_FILE", value_name = "PATH")]
    database: Option<String>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Telegram chat id
    #[arg(long = "chat-id", env = "TELEGRAM_CHATID")]
    chat_id: Option<String>,

    /// Telegram forum topic id
    #[arg(long = "thread-id", env = "TELEGRAM_THREADID")]
    thread_id: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the report to stdout instead of sending it
    #[arg(long, conflicts_with = "stats")]
    print_only: bool,

    /// Validate the configuration and print it without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    Overrides {
        database_path: cli.database.clone(),
        bot_token: cli.token.clone(),
        chat_id: cli.chat_id.clone(),
        thread_id: cli.thread_id.clone(),
    }
    .apply(&mut config);

    // Handle different modes
    if cli.stats {
        handle_stats(&config)
    } else if cli.dry_run {
        handle_dry_run(&config, !cli.print_only)
    } else {
        handle_watch(&config, cli.print_only).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("course_watch=info,warn"),
            1 => EnvFilter::new("course_watch=debug,info"),
            2 => EnvFilter::new("course_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, require_notifier: bool) -> anyhow::Result<()> {
    validate(config, require_notifier).context("invalid configuration")?;

    println!("=== course-watch Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root URL: {}", config.crawler.root_url);
    println!("  Allowed domains: {}", config.crawler.allowed_domains.join(", "));
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Detail link prefix: {}", config.crawler.detail_path_prefix);
    println!("  Excluded marker: {}", config.crawler.exclude_marker);
    println!("  Fingerprint: {}", config_fingerprint(&config.crawler)?);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    println!("\nNotifier:");
    println!("  API: {}", config.notifier.api_base);
    println!(
        "  Bot token: {}",
        if config.notifier.bot_token.is_some() { "set" } else { "not set" }
    );
    println!(
        "  Chat id: {}",
        config.notifier.chat_id.as_deref().unwrap_or("not set")
    );
    if let Some(thread_id) = &config.notifier.thread_id {
        println!("  Thread id: {}", thread_id);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.store.database_path);

    let storage = open_storage(Path::new(&config.store.database_path))
        .context("failed to open the course database")?;
    let stats = load_statistics(&storage, RECENT_COURSES)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main watch operation: crawl, store, announce
async fn handle_watch(config: &Config, print_only: bool) -> anyhow::Result<()> {
    validate(config, !print_only).context("invalid configuration")?;

    let storage = open_storage(Path::new(&config.store.database_path))
        .context("failed to open the course database")?;

    let outcome = if print_only {
        run_watch(config, storage, &StdoutNotifier).await
    } else {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
            .build()?;
        let notifier = TelegramNotifier::new(&config.notifier, client)?;
        run_watch(config, storage, &notifier).await
    };

    match outcome {
        Ok(outcome) => {
            tracing::info!(
                "Run finished: {} new, {} known, {} pages fetched, {} failed",
                outcome.new_courses.len(),
                outcome.known_courses,
                outcome.pages_fetched,
                outcome.pages_failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
