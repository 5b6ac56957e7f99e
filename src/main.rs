//! jobwire - listing collection and publishing pipeline.
//!
//! A tool for collecting job and article listings from Korean web platforms
//! into a shared spreadsheet and publishing curated summaries to Slack.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobwire::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "jobwire=info"
    } else {
        "jobwire=warn"
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
