//! Annuaire command-line entry point.
//!
//! Loads configuration, sets up console and file logging, then runs one
//! harvest until the result pages are exhausted or Ctrl-C is pressed.

use annuaire_core::AppConfig;
use annuaire_harvest::{harvest, RunState};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

const LOG_FILE: &str = "scraper.log";

#[derive(Parser)]
#[command(name = "annuaire")]
#[command(about = "Resumable harvester for the health-professional directory")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long, env = "ANNUAIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest one search scope
    Run {
        /// Search keyword (profession or specialty)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Search location (city, department or postal code)
        #[arg(short, long)]
        location: Option<String>,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Attempts per profile before it is counted as failed
        #[arg(long)]
        profile_retry: Option<u32>,

        /// Attempts per browser interaction
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Stop after this many result pages (0 means no cap)
        #[arg(short, long)]
        max_pages: Option<u32>,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Output path (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { path } => {
            let path = match path {
                Some(path) => path,
                None => AppConfig::config_path()?,
            };
            AppConfig::default()
                .save_to(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Commands::Run {
            keyword,
            location,
            headless,
            profile_retry,
            max_attempts,
            max_pages,
        } => {
            let mut config = AppConfig::load_with_env(cli.config.as_deref())
                .context("loading configuration")?;

            if let Some(keyword) = keyword {
                config.search.keyword = keyword;
            }
            if let Some(location) = location {
                config.search.location = location;
            }
            if headless {
                config.browser.headless = true;
            }
            if let Some(attempts) = profile_retry {
                config.retry.profile_attempts = attempts;
            }
            if let Some(attempts) = max_attempts {
                config.retry.max_attempts = attempts;
            }
            if let Some(pages) = max_pages {
                config.search.max_pages = pages;
            }
            config.validate().context("invalid configuration")?;

            init_tracing(cli.verbose, &config.general.log_dir)?;
            run(&config).await
        }
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    info!("Starting annuaire v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing current profile");
            on_signal.cancel();
        }
    });

    let summary = harvest(config, cancel).await?;

    println!("{} ({})", summary.stats, summary.state);
    println!("JSON: {}", summary.outputs.json_path.display());
    println!("CSV:  {}", summary.outputs.csv_path.display());

    if let Some(fatal) = summary.fatal {
        return Err(anyhow::Error::new(fatal).context("harvest stopped early"));
    }
    if summary.state == RunState::Interrupted {
        info!("Run interrupted; rerun the same scope to resume");
    }
    Ok(())
}

/// Console and file logging. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8, log_dir: &Path) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let log_path = log_dir.join(LOG_FILE);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;

    let default_filter = match verbose {
        0 => "info,annuaire=debug",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(log_file)),
        )
        .with(filter)
        .init();

    Ok(())
}
