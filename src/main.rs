//! webbot - concurrent web page smoke tester over the Chrome DevTools Protocol.

mod bot;
mod browser;
mod config;
mod models;
mod orchestrator;
mod report;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{BotConfig, ConcurrencyConfig};
use crate::models::CustomAction;

#[derive(Parser)]
#[command(name = "webbot")]
#[command(about = "Load a URL in headless Chromium, collect page statistics, run scripted actions")]
#[command(version)]
struct Cli {
    /// Target URL to test (must start with http:// or https://)
    url: Option<String>,

    /// Number of concurrent bots
    #[arg(long, default_value_t = 1)]
    bots: usize,

    /// Run the browser headless (pass --headless=false for a visible window)
    #[arg(
        long,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    headless: bool,

    /// JSON file with a list of custom actions to run after page analysis
    #[arg(long)]
    actions: Option<PathBuf>,
}

fn validate_url(url: &str) -> Result<()> {
    ensure!(
        url.starts_with("http://") || url.starts_with("https://"),
        "URL must start with http:// or https://"
    );
    Ok(())
}

fn validate_bot_count(count: usize, limits: &ConcurrencyConfig) -> Result<()> {
    ensure!(
        (limits.min_bots..=limits.max_bots).contains(&count),
        "Number of bots must be between {} and {}",
        limits.min_bots,
        limits.max_bots
    );
    Ok(())
}

fn load_actions(path: &PathBuf) -> Result<Vec<CustomAction>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read actions file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse actions file: {}", path.display()))
}

async fn try_run(cli: Cli) -> Result<i32> {
    let mut config = BotConfig::default().validated()?;
    config.browser.headless = cli.headless;

    let url = cli
        .url
        .unwrap_or_else(|| config.testing.default_url.clone());

    if let Err(error) = validate_url(&url) {
        eprintln!("Error: {error}");
        return Ok(1);
    }
    if let Err(error) = validate_bot_count(cli.bots, &config.concurrency) {
        eprintln!("Error: {error}");
        return Ok(1);
    }

    let actions = match &cli.actions {
        Some(path) => load_actions(path)?,
        None => Vec::new(),
    };

    println!("webbot - concurrent page smoke tester");
    println!("Testing: {url}");
    println!("Bots: {}", cli.bots);
    println!();

    let observer: Arc<orchestrator::BotObserver> =
        Arc::new(|bot, event| report::print_update(bot, &event));

    if cli.bots == 1 {
        let reports = orchestrator::run_bots(&url, 1, &config, &actions, Some(observer)).await;
        println!();
        report::print_report(&reports[0]);
    } else {
        println!("Running {} concurrent bots...", cli.bots);
        let reports =
            orchestrator::run_bots(&url, cli.bots, &config, &actions, Some(observer)).await;
        report::print_run_summary(&reports);
    }

    Ok(0)
}

async fn run(cli: Cli) -> i32 {
    match try_run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Fatal error: {error:#}");
            1
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("webbot=info,chromiumoxide=warn")),
        )
        .init();

    let cli = Cli::parse();

    let exit_code = tokio::select! {
        code = run(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("Test interrupted by user");
            130
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_bot_count_bounds() {
        let limits = ConcurrencyConfig::default();
        assert!(validate_bot_count(1, &limits).is_ok());
        assert!(validate_bot_count(10, &limits).is_ok());
        assert!(validate_bot_count(0, &limits).is_err());
        assert!(validate_bot_count(11, &limits).is_err());
    }

    #[test]
    fn test_cli_parses_headless_variants() {
        let cli = Cli::parse_from(["webbot", "https://example.com"]);
        assert!(cli.headless);

        let cli = Cli::parse_from(["webbot", "https://example.com", "--headless=false"]);
        assert!(!cli.headless);

        let cli = Cli::parse_from(["webbot", "https://example.com", "--headless"]);
        assert!(cli.headless);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["webbot"]);
        assert_eq!(cli.bots, 1);
        assert!(cli.url.is_none());
        assert!(cli.actions.is_none());
    }
}
