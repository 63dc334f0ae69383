mod cli;
mod commands;
mod report;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    // The TUI installs its own logger that stays off the terminal.
    if !matches!(command, Commands::Tui) {
        init_tracing();
    }
    commands::dispatch(&cli.root, command).await
}
