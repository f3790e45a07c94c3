//! toolscout CLI: extract a tool-directory listing draft from a website.
//!
//! Fetches the page, asks the configured AI provider for structured
//! metadata, reconciles it against the CMS vocabularies, and prints the
//! result as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
