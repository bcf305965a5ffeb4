//! Main entry point for the tutor service CLI.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tutor_service::{cli, server, settings::Settings, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let settings = Settings::load(args.config.as_deref())?;

    telemetry::init(&settings.logging)?;

    match args.command {
        cli::Commands::Serve { addr } => server::serve(settings, addr).await,
        cli::Commands::InitDb => {
            server::open_database(&settings).await?;
            info!("Database schema ready at {}", settings.database.url);
            Ok(())
        }
    }
}
