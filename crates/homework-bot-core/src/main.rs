//! Homework bot CLI
//!
//! Loads settings and secrets, then polls until the process is stopped.

use clap::Parser;
use homework_bot::api::PracticumClient;
use homework_bot::bot::{Poller, TelegramNotifier};
use homework_bot::config::{Credentials, LogFormat, LoggingConfig};
use homework_bot::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Relays homework review status changes to Telegram
#[derive(Parser)]
#[command(name = "homework-bot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, env = "HOMEWORK_BOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Secrets may live in a .env file next to the binary
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging, cli.verbose);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Bot stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let credentials = Credentials::from_env();
    if !credentials.tokens_present() {
        error!(
            missing = ?credentials.missing(),
            "Required environment variable is missing, the bot is stopping"
        );
    }
    let secrets = credentials.require()?;

    let client = PracticumClient::new(&config.api, &secrets.practicum_token)?;
    let notifier = TelegramNotifier::new(
        &config.telegram,
        &secrets.telegram_token,
        secrets.telegram_chat_id.as_str(),
    )?;

    info!(endpoint = %client.endpoint(), "Homework bot starting");

    let mut poller = Poller::new(client, notifier, config.polling.retry_period);

    tokio::select! {
        () = poller.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
        }
    }

    Ok(())
}
