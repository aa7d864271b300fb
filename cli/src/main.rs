mod args;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::{Commands, FullArgs};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // settings may come from a .env file; the real environment wins
    let _ = dotenvy::dotenv();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(::std::io::stderr)
        .try_init();

    let args = FullArgs::parse();
    match args.command {
        Commands::Run(args) => commands::run(args).await,
        Commands::Verify(args) => commands::verify(args).await,
        Commands::Delete(args) => commands::delete(args).await,
    }
}
