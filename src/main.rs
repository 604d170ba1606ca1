use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod params;
mod post;
#[cfg(test)]
mod test_helpers;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // stdout carries only the startup banner
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("resize_api=info,tower_http=info")),
        )
        .init();

    let cli = config::Cli::parse();
    let cfg = cli.resolve().await?;
    api::serve(cfg).await
}
