mod auth;
mod charts;
mod cli;
mod collector;
mod error;
mod providers;
mod repo;
mod snapshot;
mod store;
mod timeline;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting StarLens - GitHub repository metrics");
    cli.execute().await?;

    Ok(())
}
