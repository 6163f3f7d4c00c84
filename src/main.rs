mod activity;
mod cli;
mod config;
mod digraph;
mod error;
mod interrupt;
mod logging;
mod model;
mod prompt;
mod readers;
mod reconcile;
mod sheet;
mod sync;
mod tracker;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = cli::Cli::parse();
    cli::run(cli).await
}
