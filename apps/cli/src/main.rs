use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tubenotes_core::{
    BatchReport, Config, ExtractionError, Model, NotionStore, OpenAiBackend, Pipeline,
    PublishError, Publisher, StageError, SummarizationError, Summarizer, YtDlp,
};

use crate::{input::collect_urls, progress::SpinnerObserver};

mod input;
mod progress;

/// CLI wrapper for Model enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliModel {
    #[value(name = "gpt-4o")]
    Gpt4o,
    #[default]
    #[value(name = "gpt-4o-mini")]
    Gpt4oMini,
    #[value(name = "o1")]
    O1,
    #[value(name = "o3-mini")]
    O3Mini,
}

impl From<CliModel> for Model {
    fn from(cli: CliModel) -> Self {
        match cli {
            CliModel::Gpt4o => Model::Gpt4o,
            CliModel::Gpt4oMini => Model::Gpt4oMini,
            CliModel::O1 => Model::O1,
            CliModel::O3Mini => Model::O3Mini,
        }
    }
}

#[derive(Parser)]
#[command(name = "tubenotes")]
#[command(about = "Summarize YouTube videos with OpenAI and save the summaries to a Notion database")]
struct Cli {
    /// Video URL. Without a URL or --file, URLs are read interactively.
    url: Option<String>,

    /// File with one video URL per line (batch mode)
    #[arg(short, long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// OpenAI model used for summarization
    #[arg(short, long, default_value = "gpt-4o-mini")]
    model: CliModel,

    /// Config file (defaults to ~/.config/tubenotes/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tubenotes={level},tubenotes_core={level}")));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
}

fn build_pipeline(config: &Config, model: Model) -> Result<Pipeline> {
    let ytdlp = Arc::new(YtDlp::new(config.extractor.clone()));
    let backend = Arc::new(OpenAiBackend::new(&config.openai)?);
    let store = Arc::new(NotionStore::new(&config.notion)?);
    let database_id = config
        .notion
        .database_id
        .clone()
        .ok_or_else(|| anyhow!("NOTION_DATABASE_ID is not set"))?;

    Ok(Pipeline::new(
        ytdlp.clone(),
        ytdlp,
        Summarizer::new(backend, config.summarizer.clone()),
        Publisher::new(store, database_id),
        model.id(),
    ))
}

/// Actionable advice for failures users can fix themselves.
fn hint(error: &StageError) -> Option<&'static str> {
    match error {
        StageError::Extraction(ExtractionError::TranscriptNotFound { .. }) => Some(
            "Only videos with captions (manual or auto-generated) can be summarized.",
        ),
        StageError::Extraction(ExtractionError::TranscriptFailed { reason, .. })
            if reason.starts_with("failed to run") =>
        {
            Some("Is yt-dlp installed? Set YTDLP_PATH or extractor.ytdlp_path to its location.")
        }
        StageError::Publish(PublishError::Rejected { status: 404, .. }) => Some(
            "Database not found. Check NOTION_DATABASE_ID and share the database with your integration.",
        ),
        StageError::Publish(PublishError::Rejected { status: 401, .. }) => {
            Some("Notion authentication failed. Check NOTION_API_KEY.")
        }
        StageError::Publish(PublishError::Incomplete { .. }) => {
            Some("The page exists but is missing content. Fix it in Notion rather than re-running.")
        }
        StageError::Summarization(SummarizationError::Upstream { reason }) if reason.contains("401") => {
            Some("OpenAI authentication failed. Check OPENAI_API_KEY.")
        }
        _ => None,
    }
}

fn print_report(report: &BatchReport) {
    println!("\n{}", style("─".repeat(60)).dim());

    for outcome in &report.outcomes {
        let label = outcome.video_id.as_deref().unwrap_or(&outcome.input);
        match &outcome.result {
            Ok(published) => println!(
                "{} {}  {}",
                style("✓").green().bold(),
                label,
                style(&published.page.url).cyan()
            ),
            Err(failure) => {
                println!(
                    "{} {}  {} ({})",
                    style("✗").red().bold(),
                    label,
                    failure.error,
                    style(format!("{}, {}", failure.error.kind(), failure.stage)).dim()
                );
                if let Some(hint) = hint(&failure.error) {
                    println!("  {} {}", style("hint:").yellow(), hint);
                }
            }
        }
    }

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} succeeded, {} failed",
        style(report.succeeded_count()).green().bold(),
        style(report.failed_count()).red().bold()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let model: Model = cli.model.into();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Validate credentials early
    if let Err(e) = config.require_credentials() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        eprintln!("Set them in the environment or in a .env file.");
        std::process::exit(1);
    }

    let urls = collect_urls(cli.url, cli.file.as_deref())?;
    if urls.is_empty() {
        eprintln!("{} No video URLs given", style("Error:").red().bold());
        std::process::exit(1);
    }

    let pipeline = build_pipeline(&config, model)?;

    println!(
        "\n{}  {}  {}",
        style("tubenotes").cyan().bold(),
        style("YouTube → Notion").dim(),
        style(model.name()).dim()
    );

    debug!(model = model.name(), videos = urls.len(), "starting batch");
    let total_start = Instant::now();
    let observer = SpinnerObserver::new();
    let report = pipeline.run_batch(&urls, &observer).await;
    info!(
        succeeded = report.succeeded_count(),
        failed = report.failed_count(),
        elapsed_ms = total_start.elapsed().as_millis() as u64,
        "run complete"
    );

    print_report(&report);
    println!(
        "{} Total time: {}",
        style("⏱").dim(),
        progress::format_elapsed(total_start.elapsed())
    );

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
