// vigil/src/main.rs

use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // Logs go to stderr so `--format json` output stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { store } => commands::init::execute(store)?,
        Commands::Import { file, store } => commands::import::execute(file, store).await?,
        Commands::Rules {
            store,
            status,
            format,
        } => commands::rules::execute(store, status, format).await?,
        Commands::Compile {
            store,
            rule_id,
            format,
        } => commands::compile::execute(store, rule_id, format).await?,
        Commands::Scan { store, format } => commands::scan::execute(store, format).await?,
        Commands::Violations {
            store,
            severity,
            status,
            format,
        } => commands::violations::execute(store, severity, status, format).await?,
    }

    Ok(())
}
