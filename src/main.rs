use anyhow::Result;
use clap::Parser;
use leetcode_notebooks::{
    config::ScrapeConfig,
    leetcode::LeetcodeScraperBuilder,
    listing::Difficulty,
    session::WebDriverSession,
};
use std::{backtrace::BacktraceStatus, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Scrape LeetCode problems into Jupyter notebooks.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[arg(short, long, default_value = "easy")]
    difficulty: Difficulty,

    #[arg(short, long, default_value = "leetcode-notebooks.toml")]
    config: PathBuf,

    /// WebDriver server to drive the browser through.
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver: String,

    #[arg(long)]
    headless: bool,

    /// Stop after this problem number.
    #[arg(long)]
    max_index: Option<u32>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();
    let mut config = ScrapeConfig::load_or_default(&args.config)?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let poll_interval = config.poll_interval();
    let scraper = LeetcodeScraperBuilder::default()
        .config(config)
        .difficulty(args.difficulty)
        .max_index(args.max_index)
        .build()?;

    let session = WebDriverSession::connect(&args.webdriver, args.headless, poll_interval).await?;
    let result = scraper.run(&session).await;
    if let Err(e) = &result {
        error!("run aborted: {}", diagnostic(e));
    }
    session.quit().await?;

    let summary = result?;
    info!(
        processed = summary.processed.len(),
        locked = summary.skipped_locked.len(),
        unavailable = summary.skipped_unavailable.len(),
        notebooks = summary.documents.len(),
        "done"
    );
    Ok(())
}

/// The cause chain, plus where the error was raised when a backtrace was
/// captured (`RUST_LIB_BACKTRACE=1`).
fn diagnostic(e: &anyhow::Error) -> String {
    let backtrace = e.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        format!("{e:#}\n{backtrace}")
    } else {
        format!("{e:#}")
    }
}
