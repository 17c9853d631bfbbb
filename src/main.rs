//! Financial-onboarding document intake & routing pipeline.
//!
//! Watches a scanned-document intake directory, OCRs and parses each file's
//! name and account number, and routes it into one of three output
//! directories.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_router::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "intake_router=info"
    } else {
        "intake_router=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
