//! autoprice - Main Entry Point

use autoprice::cli::{cmd_metrics, cmd_predict, cmd_run, cmd_sync, cmd_train, resolve_config, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoprice=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data } => {
            let config = resolve_config(&cli.global)?;
            cmd_train(&config, &data)?;
        }
        Commands::Predict { data, output } => {
            let config = resolve_config(&cli.global)?;
            cmd_predict(&config, &data, &output)?;
        }
        Commands::Run { data, output } => {
            let config = resolve_config(&cli.global)?;
            cmd_run(&config, &data, &output)?;
        }
        Commands::Sync { existing, incoming, output, run } => {
            let config = resolve_config(&cli.global)?;
            cmd_sync(&config, &existing, &incoming, &output, run.as_deref())?;
        }
        Commands::Metrics => {
            let config = resolve_config(&cli.global)?;
            cmd_metrics(&config)?;
        }
    }

    Ok(())
}
