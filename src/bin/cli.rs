//! SONAR CLI
//!
//! Batch entry point meant to be run from cron: one pass over the users
//! directory, then exit.

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use sonar::{
    error::Result,
    models::SharedConfig,
    pipeline::{self, RunOptions},
    services::{ArxivClient, ConsoleMailer, Mailer, SmtpMailer},
    storage::UserStore,
};

/// SONAR - emails new arXiv papers matching each user's search query
#[derive(Parser, Debug)]
#[command(name = "sonar", version, about = "arXiv search notifier")]
struct Cli {
    /// Directory containing one YAML file per user
    #[arg(long)]
    users_dir: PathBuf,

    /// Shared configuration file (SMTP settings)
    #[arg(long)]
    config: PathBuf,

    /// Print emails to stdout instead of sending them
    #[arg(long)]
    print_only: bool,

    /// Do not update last_run in the user files
    #[arg(long)]
    no_update: bool,

    /// Test mode: implies --print-only and --no-update
    #[arg(long)]
    test: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let started_at = Utc::now();

    // Without SMTP settings nothing can be delivered: fail before any user.
    let config = SharedConfig::load(&cli.config).inspect_err(|e| {
        log::error!("Cannot load shared configuration: {e}");
    })?;
    log::info!("Loaded configuration from {}", cli.config.display());

    let print_only = cli.print_only || cli.test;
    let update_state = !(cli.no_update || cli.test);
    if cli.test {
        log::info!("Test mode: emails are printed and last_run is left unchanged");
    }

    let source = ArxivClient::new(config.arxiv.clone())?;
    let mailer: Box<dyn Mailer> = if print_only {
        Box::new(ConsoleMailer)
    } else {
        Box::new(SmtpMailer::new(&config)?)
    };
    let store = UserStore::new(&cli.users_dir);
    let options = RunOptions {
        started_at,
        update_state,
    };

    let summary = pipeline::run_batch(&store, &source, mailer.as_ref(), &options).await;

    log::info!(
        "Run complete: {} users, {} notified, {} up to date, {} failed",
        summary.users,
        summary.notified,
        summary.up_to_date,
        summary.failed
    );

    Ok(())
}
