//! Pitch Intel - tactical metrics for football match data
//!
//! # Usage
//!
//! ```bash
//! # Full analysis, bundle to stdout
//! pitch-intel analyze --events events.json --phases phases.json --team-id match_001
//!
//! # Bypass the result cache and write to a file
//! pitch-intel analyze --events events.jsonl --no-cache --output report.json
//!
//! # List the analytic sections
//! pitch-intel sections
//! ```
//!
//! # Environment Variables
//!
//! - `PITCH_INTEL_CONFIG`: Path to an engine config TOML (default: ./pitch_intel.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use pitch_intel::{Dataset, EngineConfig, MetricsEngine, SectionRegistry, Table};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pitch-intel")]
#[command(about = "Football tactical metrics engine")]
#[command(version)]
struct CliArgs {
    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Events table (JSON records/columns, or JSONL)
    #[arg(long)]
    events: PathBuf,

    /// Phases table (optional)
    #[arg(long)]
    phases: Option<PathBuf>,

    /// Team or match identifier
    #[arg(long)]
    team_id: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Compute every section and print the result bundle
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Skip the result cache for this run
        #[arg(long)]
        no_cache: bool,

        /// Write the bundle here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Engine config TOML
        #[arg(long, env = "PITCH_INTEL_CONFIG")]
        config: Option<PathBuf>,
    },
    /// List the analytic sections in execution order
    Sections,
    /// Remove every cached result bundle
    ClearCache {
        /// Engine config TOML
        #[arg(long, env = "PITCH_INTEL_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the cache key for a dataset
    Fingerprint {
        #[command(flatten)]
        input: InputArgs,

        /// Engine config TOML
        #[arg(long, env = "PITCH_INTEL_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(EngineConfig::load()),
    }
}

fn load_dataset(input: &InputArgs) -> Result<Dataset> {
    let events = Table::load(&input.events, "events")
        .with_context(|| format!("Failed to read events from {}", input.events.display()))?;
    let phases = input
        .phases
        .as_deref()
        .map(|path| {
            Table::load(path, "phases")
                .with_context(|| format!("Failed to read phases from {}", path.display()))
        })
        .transpose()?;

    info!(
        events = events.len(),
        phases = phases.as_ref().map_or(0, Table::len),
        "Loaded match data"
    );
    Ok(Dataset::new(events, phases, input.team_id.clone()))
}

fn analyze(
    input: &InputArgs,
    no_cache: bool,
    output: Option<&Path>,
    config: EngineConfig,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let engine = MetricsEngine::with_standard_sections(config)
        .context("Failed to initialize metrics engine")?;

    let bundle = engine
        .compute_all(&dataset, !no_cache, |completed, total, message| {
            info!("[{}/{}] {}", completed, total, message);
        })
        .context("Metrics computation failed")?;

    for failed in bundle.failed_sections() {
        warn!(
            section = %failed.id,
            error = failed.error().unwrap_or("unknown"),
            "Section failed"
        );
    }

    let json = bundle.to_json_pretty().context("Failed to serialize result bundle")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Result bundle written");
        }
        None => println!("{}", json),
    }

    info!(
        sections = bundle.summary.total_sections,
        successful = bundle.summary.successful_sections,
        failed = bundle.summary.failed_sections,
        duration_secs = bundle.summary.duration_secs,
        "Analysis complete"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        SubCommand::Analyze {
            input,
            no_cache,
            output,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            analyze(&input, no_cache, output.as_deref(), config)?;
        }
        SubCommand::Sections => {
            for (i, section) in SectionRegistry::standard().catalog().iter().enumerate() {
                println!("{:>2}. {} {:<28} ({})", i + 1, section.icon, section.name, section.id);
            }
        }
        SubCommand::ClearCache { config } => {
            let config = load_config(config.as_deref())?;
            let engine = MetricsEngine::with_standard_sections(config)
                .context("Failed to initialize metrics engine")?;
            let removed = engine.clear_cache().context("Failed to clear result cache")?;
            println!("Removed {} cached bundle(s)", removed);
        }
        SubCommand::Fingerprint { input, config } => {
            let config = load_config(config.as_deref())?;
            let dataset = load_dataset(&input)?;
            let dataset_key = pitch_intel::fingerprint(&dataset, config.cache.content_digest);
            let key = pitch_intel::scoped_key(
                &dataset_key,
                &SectionRegistry::standard().ids(),
                &config.engine,
            );
            println!("{}", key);
        }
    }

    Ok(())
}
