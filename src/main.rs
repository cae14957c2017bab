mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "py_entities=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Extract { path, root, pretty } => {
            cli::extract(&path, root.as_deref(), config, pretty)?;
        }
        Commands::Imports { file, root } => {
            cli::imports(&file, root.as_deref(), config)?;
        }
        Commands::Symbols { file, name } => {
            cli::symbols(&file, &name, config)?;
        }
        Commands::Stats { path } => {
            cli::stats(&path, config)?;
        }
    }

    Ok(())
}
