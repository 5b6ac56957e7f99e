//! CLI commands implementation.

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{source, PublisherSettings, SourceSpec, StoreSettings, SOURCES};
use crate::llm::{LlmConfig, OpenAiClient};
use crate::models::RecordStatus;
use crate::notify::SlackNotifier;
use crate::scrapers::{Extractor, HttpPageFetcher, SideprojectExtractor, WantedExtractor};
use crate::services::{CollectService, Outcome, PublishMode, PublishService, RowOutcome};
use crate::store::{RecordStore, SheetsConfig, SheetsStore};

use super::helpers::truncate;

#[derive(Parser)]
#[command(name = "jobwire")]
#[command(about = "Collects job/article listings into a spreadsheet and publishes curated summaries to Slack")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Collect new listings from a source into its worksheet
    Collect {
        /// Source IDs to collect (can specify multiple, or use --all)
        sources: Vec<String>,
        /// Collect every configured source
        #[arg(short, long)]
        all: bool,
    },

    /// Publish eligible rows from a source's worksheet to Slack
    Publish {
        /// Source whose worksheet to publish from
        source: String,
        /// Process every eligible row instead of stopping after one delivery
        #[arg(short, long)]
        all: bool,
        /// Limit number of rows to process (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
        /// Judge suitability before summarizing, recording the verdict
        #[arg(short, long)]
        classify: bool,
    },

    /// Show per-status row counts for every worksheet
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect { sources, all } => cmd_collect(&sources, all).await,
        Commands::Publish {
            source,
            all,
            limit,
            classify,
        } => cmd_publish(&source, all, limit, classify).await,
        Commands::Status => cmd_status().await,
    }
}

fn open_store(settings: &StoreSettings, spec: &SourceSpec) -> anyhow::Result<SheetsStore> {
    let config = SheetsConfig::new(&settings.spreadsheet_id, spec.worksheet, &settings.token);
    Ok(SheetsStore::new(config)?)
}

fn make_extractor(spec: &SourceSpec) -> anyhow::Result<Box<dyn Extractor>> {
    match spec.id {
        "wanted" => Ok(Box::new(WantedExtractor::new()?)),
        "sideproject" => Ok(Box::new(SideprojectExtractor::new()?)),
        other => anyhow::bail!("source {other:?} has no extractor"),
    }
}

async fn cmd_collect(source_ids: &[String], all: bool) -> anyhow::Result<()> {
    let specs: Vec<&SourceSpec> = if all {
        SOURCES.iter().collect()
    } else if source_ids.is_empty() {
        anyhow::bail!("specify at least one source, or use --all");
    } else {
        source_ids
            .iter()
            .map(|id| source(id))
            .collect::<Result<_, _>>()?
    };

    let settings = StoreSettings::from_env()?;

    for spec in specs {
        println!(
            "{} Collecting {}...",
            style("→").cyan(),
            style(spec.id).bold()
        );

        let store = open_store(&settings, spec)?;
        let extractor = make_extractor(spec)?;
        let service = CollectService::new(store, spec.initial_status);
        let report = service.run(extractor.as_ref()).await?;

        println!(
            "  {} {} appended, {} already stored, {} duplicate in batch",
            style("✓").green(),
            report.appended,
            report.skipped_existing,
            report.skipped_in_batch
        );
    }

    Ok(())
}

async fn cmd_publish(source_id: &str, all: bool, limit: usize, classify: bool) -> anyhow::Result<()> {
    let spec = source(source_id)?;
    let store_settings = StoreSettings::from_env()?;
    let publisher_settings = PublisherSettings::from_env()?;

    let store = open_store(&store_settings, spec)?;
    let fetcher = HttpPageFetcher::new()?;
    let enricher = OpenAiClient::new(LlmConfig::new(&publisher_settings.openai_api_key))?;
    let notifier = SlackNotifier::new(&publisher_settings.slack_webhook_url)?;

    let mode = if all {
        PublishMode::All
    } else {
        PublishMode::FirstSuccess
    };
    let limit = (limit > 0).then_some(limit);

    let service = PublishService::new(store, fetcher, enricher, notifier)
        .with_mode(mode)
        .with_style(spec.style)
        .with_classification(classify)
        .with_limit(limit);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Publishing from {}...", spec.worksheet));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = service.run().await;
    spinner.finish_and_clear();
    let report = result?;

    if report.outcomes.is_empty() {
        println!("{} No eligible rows to publish", style("!").yellow());
        return Ok(());
    }

    for row in &report.outcomes {
        print_outcome(row);
    }
    println!(
        "\n{} published, {} dropped, {} failed",
        style(report.count(Outcome::Published)).green(),
        style(report.count(Outcome::Dropped)).yellow(),
        style(report.count(Outcome::Failed)).red()
    );

    Ok(())
}

fn print_outcome(row: &RowOutcome) {
    let title = truncate(&row.title, 60);
    match row.outcome {
        Outcome::Published => {
            println!("  {} row {} published: {}", style("✓").green(), row.row_number, title);
        }
        Outcome::Dropped => {
            println!(
                "  {} row {} dropped: {} ({})",
                style("→").yellow(),
                row.row_number,
                title,
                truncate(row.detail.as_deref().unwrap_or("unsuitable"), 60)
            );
        }
        Outcome::Failed => {
            println!(
                "  {} row {} failed: {} ({})",
                style("✗").red(),
                row.row_number,
                title,
                truncate(row.detail.as_deref().unwrap_or("error"), 80)
            );
        }
    }
}

async fn cmd_status() -> anyhow::Result<()> {
    let settings = StoreSettings::from_env()?;

    println!("\n{}", style("Jobwire Status").bold());
    println!("{}", "-".repeat(40));

    for spec in SOURCES {
        let store = open_store(&settings, spec)?;
        let snapshot = store.read_all().await?;

        println!("\n{} ({} rows)", style(spec.worksheet).bold(), snapshot.rows.len());
        if snapshot.is_empty() {
            println!("  {} worksheet is empty", style("!").yellow());
            continue;
        }

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut unrecognized = 0usize;
        for i in 0..snapshot.rows.len() {
            match snapshot
                .view(i)
                .get("status")
                .map(RecordStatus::parse)
            {
                Some(Ok(status)) => *counts.entry(status.as_str()).or_default() += 1,
                _ => unrecognized += 1,
            }
        }
        for (status, count) in &counts {
            println!("  {:<12} {}", format!("{status}:"), count);
        }
        if unrecognized > 0 {
            println!("  {:<12} {}", "other:", unrecognized);
        }
    }

    Ok(())
}
