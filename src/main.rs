use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_courier::app::AppContext;
use feed_courier::cli::{commands, Cli, Commands, StateAction};
use feed_courier::config::{self, AppConfig};
use feed_courier::store::JsonStateStore;

/// Exit status when some entries were deferred by a failed delivery.
const EXIT_DEFERRED: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let mut config = AppConfig::load(cli.config.as_deref())?;
            if let Some(path) = cli.state_file {
                config.state_file = path;
            }
            tracing::debug!("{:?}", config);

            let ctx = AppContext::new(config)?;
            let summary = commands::run(&ctx).await?;
            if !summary.is_clean() {
                return Ok(ExitCode::from(EXIT_DEFERRED));
            }
        }
        Commands::State { action } => {
            let path = match cli.state_file {
                Some(path) => path,
                None => config::state_file_path(cli.config.as_deref())?,
            };
            let store = JsonStateStore::new(path);
            match action {
                StateAction::Show => commands::show_state(&store)?,
                StateAction::Reset => commands::reset_state(&store)?,
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
