use anyhow::Result;
use careergpt::cli::{self, Cli};
use clap::Parser;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("careergpt=info,careergpt_backend=info,rocket=warn")),
        )
        .init();

    let cli = Cli::parse();
    cli::run(cli).await
}
