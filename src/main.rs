//! CLI entry point for the chartflow analyzer.
//!
//! Provides subcommands for the viewer and producer perspectives over a
//! weekly top-charts dataset, plus a listing of selectable countries.

use anyhow::{Context, Result, bail};
use chartflow::analyzers::{AnalysisError, producer, viewer};
use chartflow::dataset::{Category, CategoryView, DatasetCache, TARGET_COUNTRIES};
use chartflow::output;
use chartflow::summarize::{self, GEMINI_MODELS, GeminiClient};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "chartflow")]
#[command(about = "Explore weekly top-charts content flows between countries", long_about = None)]
struct Cli {
    /// Path to the weekly charts CSV (or zip-compressed CSV)
    #[arg(short, long, global = true, default_value = "weekly_charts.csv")]
    input: String,

    /// Content category to analyze
    #[arg(short, long, global = true, value_enum, default_value_t = Category::Films)]
    category: Category,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze which countries supply content to a market
    Viewer {
        /// Market country to analyze
        #[arg(value_name = "COUNTRY")]
        country: String,

        #[command(flatten)]
        summary: SummaryOpts,

        /// Emit the report bundle as JSON instead of text tables
        #[arg(long)]
        json: bool,
    },
    /// Analyze where a country's productions chart
    Producer {
        /// Producing country to analyze
        #[arg(value_name = "COUNTRY")]
        country: String,

        #[command(flatten)]
        summary: SummaryOpts,

        /// Emit the report bundle as JSON instead of text tables
        #[arg(long)]
        json: bool,
    },
    /// List countries selectable for the chosen category
    Countries,
}

#[derive(Args)]
struct SummaryOpts {
    /// Request a narrative summary from the text-generation API
    #[arg(long)]
    summarize: bool,

    /// Text-generation model identifier
    #[arg(long, default_value = GEMINI_MODELS[0])]
    model: String,

    /// API key; falls back to the GEMINI_API_KEY environment variable
    #[arg(long)]
    api_key: Option<String>,
}

impl SummaryOpts {
    fn key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/chartflow.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("chartflow.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    // A load failure is fatal for the whole session
    let cache = DatasetCache::new();
    let dataset = cache
        .load(Path::new(&cli.input))
        .with_context(|| format!("cannot load dataset from {}", cli.input))?;

    let view = dataset.category(cli.category);
    info!(
        rows = view.rows.len(),
        category = %cli.category,
        "Dataset ready"
    );

    match cli.command {
        Commands::Countries => {
            for country in view.selectable_countries(&TARGET_COUNTRIES) {
                println!("{country}");
            }
        }
        Commands::Viewer {
            country,
            summary,
            json,
        } => run_viewer(&view, &country, &summary, json).await?,
        Commands::Producer {
            country,
            summary,
            json,
        } => run_producer(&view, &country, &summary, json).await?,
    }

    Ok(())
}

fn check_country(country: &str) -> Result<()> {
    if !TARGET_COUNTRIES.contains(&country) {
        bail!("{country} is not a supported country; run `chartflow countries` for the list");
    }
    Ok(())
}

async fn run_viewer(
    view: &CategoryView<'_>,
    country: &str,
    summary: &SummaryOpts,
    json: bool,
) -> Result<()> {
    check_country(country)?;

    let report = match viewer::report(view, country) {
        Ok(report) => report,
        Err(e) => {
            // Reported inline; the session itself is fine
            warn!(%country, error = %e, "Viewer analysis unavailable");
            output::notice(&e.to_string());
            return Ok(());
        }
    };

    if json {
        output::print_json(&report)?;
    } else {
        output::print_viewer(&report);
    }

    if summary.summarize {
        let prompt = summarize::viewer_prompt(country, view.category.label(), &report.digest());
        print_summary(summary, &prompt).await;
    }

    Ok(())
}

async fn run_producer(
    view: &CategoryView<'_>,
    country: &str,
    summary: &SummaryOpts,
    json: bool,
) -> Result<()> {
    check_country(country)?;

    let report = match producer::report(view, country) {
        Ok(report) => report,
        Err(e) => {
            warn!(%country, error = %e, "Producer analysis unavailable");
            output::notice(&e.to_string());
            return Ok(());
        }
    };

    // Feature-level failures skip only that feature
    let genre = match producer::genre_split(view, country) {
        Ok(split) => Some(split),
        Err(e @ AnalysisError::MissingColumn { .. }) => {
            warn!(error = %e, "Genre split skipped");
            output::notice(&e.to_string());
            None
        }
        Err(e) => return Err(e.into()),
    };
    let matrix = producer::export_matrix(view, country);

    if json {
        output::print_json(&serde_json::json!({
            "report": report,
            "genre_split": genre,
            "export_matrix": matrix,
        }))?;
    } else {
        output::print_producer(&report);
        if let Some(split) = &genre {
            output::print_genre_split(split);
        }
        output::print_export_matrix(&matrix);
    }

    if summary.summarize {
        let prompt = summarize::producer_prompt(country, view.category.label(), &report.digest());
        print_summary(summary, &prompt).await;
    }

    Ok(())
}

async fn print_summary(summary: &SummaryOpts, prompt: &str) {
    let text = match GeminiClient::new(summary.key(), summary.model.clone()) {
        Ok(client) => summarize::summarize(&client, prompt).await,
        Err(e) => format!("Summary unavailable: {e}"),
    };
    println!("\n== Narrative summary ==\n{text}");
}
