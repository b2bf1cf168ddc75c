// Review responder binary
//
// Loads the newest review export, drafts replies, and runs the terminal
// review browser. Logs go to a file so they never corrupt the UI.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_responder::automation::{GoogleReviewsAdapter, SubmissionRunner};
use review_responder::drafter::{DraftBook, Drafter, OpenAiClient};
use review_responder::store::ReviewStore;
use review_responder::ui::{self, App, AppEventSender};
use review_responder::utils::constants::DEFAULT_LOG_FILE;
use review_responder::{Config, load_yaml_config};

#[derive(Debug, Parser)]
#[command(name = "review-responder", version, about = "Draft and post replies to customer reviews")]
struct Cli {
    /// YAML config file (defaults to ./review-responder.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding review exports; the newest file is used
    #[arg(long, env = "REVIEWS_DIR")]
    reviews_dir: Option<PathBuf>,

    /// Run the automation browser without a window
    #[arg(long)]
    headless: bool,

    /// Skip the completion service and start with empty drafts
    #[arg(long)]
    no_draft: bool,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = load_yaml_config(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());

    if let Some(dir) = &cli.reviews_dir {
        config.store.reviews_dir = Some(dir.clone());
    }
    if cli.headless {
        config.browser.headless = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = load_config(&cli)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let reviews_dir = config.reviews_dir();
    let store = ReviewStore::open_latest(&reviews_dir, &config.store.extension)
        .with_context(|| format!("Failed to load reviews from {}", reviews_dir.display()))?;

    let drafts = if cli.no_draft {
        info!("Drafting disabled; starting with empty drafts");
        DraftBook::empty(store.table().len())
    } else {
        let client = OpenAiClient::new(&config.completion)
            .context("Completion client unavailable (use --no-draft to skip drafting)")?;
        info!("Drafting with model {}", client.model());
        let drafter = Drafter::new(Arc::new(client), config.drafter.clone());
        eprintln!("Drafting replies for {} reviews...", store.table().len());
        runtime.block_on(drafter.draft_all(store.table()))
    };

    let adapter = GoogleReviewsAdapter::new(config.browser.clone(), config.automation.clone())
        .context("Invalid automation settings")?;

    let (tx, rx) = mpsc::channel();
    let sender = AppEventSender::new(tx);
    let runner = SubmissionRunner::new(
        runtime.handle().clone(),
        Arc::new(adapter),
        config.automation.max_concurrent_sessions,
        sender.clone(),
    );

    let app = App::new(store, drafts);
    ui::run(app, &runner, rx, sender).context("Terminal UI failed")?;

    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    Ok(())
}
