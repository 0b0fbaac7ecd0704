//! musan-analyzer command line
//!
//! Runs one analysis and prints the report as JSON on stdout. Logs go to
//! stderr (or the configured log file) so the output stays machine-readable.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use musan_analyzer::config::AnalyzerConfig;
use musan_analyzer::models::{AnalysisReport, EntityKind};
use musan_analyzer::AnalysisPipeline;
use musan_common::config::{default_config_path, load_toml_config, LoggingConfig, TomlConfig};
use musan_common::human_time::format_track_duration_opt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "musan-analyzer", version, about = "Listening history analyzer")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "MUSAN_CONFIG")]
    config: Option<PathBuf>,

    /// Skip catalog enrichment
    #[arg(long)]
    no_catalog: bool,

    /// Print a plain-text summary instead of JSON
    #[arg(long)]
    text: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rankings for a predefined period
    Top {
        #[arg(short, long)]
        user: String,
        /// 7day, 1month, 3month, 6month, 12month or overall
        #[arg(short, long, default_value = "overall")]
        period: String,
    },
    /// Rankings and chart series for a calendar range (YYYY-MM-DD)
    Custom {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Analyze exported streaming-history JSON files
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Load the config file before any subscriber exists
///
/// Returns whether the file was found so the outcome can be logged once
/// tracing is up.
fn read_startup_config(path: &Path) -> Result<(TomlConfig, bool)> {
    let found = path.exists();
    let config = load_toml_config(path)?;
    Ok((config, found))
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("musan_analyzer={0},musan_common={0}", logging.level)));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };
    let stderr_layer = logging
        .file
        .is_none()
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

fn print_text(report: &AnalysisReport) {
    let summary = &report.summary;
    println!("Scrobbles: {}", summary.total_scrobbles);
    println!(
        "Tracks: {}  Albums: {}  Artists: {}",
        summary.distinct_tracks, summary.distinct_albums, summary.distinct_artists
    );
    if let Some(per_day) = summary.average_scrobbles_per_day {
        println!("Per day: {:.1}", per_day);
    }
    if let Some(total) = &summary.total_listening_time {
        println!("Listening time: {}", total);
    }

    println!();
    println!("Top tracks:");
    for (rank, merged) in report.table(EntityKind::Track).iter().take(10).enumerate() {
        let duration = format_track_duration_opt(merged.catalog.as_ref().and_then(|c| c.duration_secs()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}. {} - {} ({} plays, {})",
            rank + 1,
            merged.row.artist.as_deref().unwrap_or("?"),
            merged.row.name,
            merged.row.scrobble_count,
            duration
        );
    }

    if !report.similar_artists.is_empty() {
        println!();
        println!("You might also like:");
        for artist in &report.similar_artists {
            println!("  {} ({:.2})", artist.name, artist.score);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The logging section lives in the config file, so tracing starts after it is read
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let (toml_config, config_found) = read_startup_config(&config_path)?;
    init_tracing(&toml_config.logging)?;

    info!("Starting musan-analyzer v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!(path = %config_path.display(), "Loaded configuration");
    } else {
        warn!(
            path = %config_path.display(),
            "Config file not found, using built-in defaults"
        );
    }

    let mut config = AnalyzerConfig::from_toml(&toml_config)?;
    if args.no_catalog {
        config = config.without_catalog();
    }
    let pipeline = AnalysisPipeline::from_config(&config)?;

    let outcome = match &args.command {
        Command::Top { user, period } => pipeline.analyze_predefined(user, period).await,
        Command::Custom { user, start, end } => pipeline.analyze_custom(user, start, end).await,
        Command::Import { files } => pipeline.analyze_imported(files).await,
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Analysis failed");
            anyhow::bail!(e.user_message());
        }
    };

    if args.text {
        print_text(&report);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
