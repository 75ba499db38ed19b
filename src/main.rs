//! well-log-qc - Layer-aware well-log cleaning
//!
//! Cleans log curves layer by layer and writes the cleaned wells together
//! with a report of every removed sample.
//!
//! # Usage
//!
//! ```bash
//! # Clean two wells with the layers of a horizon table
//! well-log-qc clean --well W1.json --well W2.json --layers layers.json --out-dir cleaned
//!
//! # Per-layer statistics of one curve
//! well-log-qc stats --well W1.json --picks picks.json --curve GR
//!
//! # Validate a rule file and print the effective config
//! well-log-qc check-config qc_config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `WELL_QC_CONFIG`: Path to the rule file (default: ./qc_config.toml)
//! - `WELL_QC_OUT_DIR`: Output directory of `clean` (default: ./cleaned)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use well_log_qc::config::validation::{validate_physical_ranges, validate_unknown_keys};
use well_log_qc::pipeline::{run_batch, BatchSummary, Pipeline, WellOutcome};
use well_log_qc::{describe_layers, HorizonPick, LayerTable, QcConfig, Well};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "well-log-qc")]
#[command(about = "Layer-aware outlier cleaning for well-log curves")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Clean one or more wells and write cleaned wells plus reports
    Clean {
        /// Well JSON file (repeatable)
        #[arg(long = "well", required = true)]
        wells: Vec<PathBuf>,

        #[command(flatten)]
        layers: LayerSource,

        /// Rule file; without it $WELL_QC_CONFIG and ./qc_config.toml are tried
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long, env = "WELL_QC_OUT_DIR", default_value = "cleaned")]
        out_dir: PathBuf,

        /// Cut wells to their layer span (plus this padding, metres) before cleaning
        #[arg(long, value_name = "METRES")]
        truncate_padding: Option<f64>,
    },

    /// Print per-layer statistics of one curve as JSON
    Stats {
        /// Well JSON file
        #[arg(long)]
        well: PathBuf,

        #[command(flatten)]
        layers: LayerSource,

        /// Curve mnemonic
        #[arg(long)]
        curve: String,
    },

    /// Validate a rule file and print the effective configuration
    CheckConfig {
        /// Path to the TOML rule file
        path: PathBuf,
    },
}

/// Where the layers come from: a layer table or raw horizon picks
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct LayerSource {
    /// Layer table JSON: [{well_id, layer_name, top, base}, ...]
    #[arg(long)]
    layers: Option<PathBuf>,

    /// Horizon picks JSON: [{well, md, surface}, ...]
    #[arg(long)]
    picks: Option<PathBuf>,
}

impl LayerSource {
    fn load(&self) -> Result<LayerTable> {
        if let Some(path) = &self.layers {
            return read_json(path);
        }
        if let Some(path) = &self.picks {
            let picks: Vec<HorizonPick> = read_json(path)?;
            return Ok(LayerTable::from_picks(&picks));
        }
        warn!("No layers given, only prior bounds will apply");
        Ok(LayerTable::default())
    }
}

// ============================================================================
// Run Manifest
// ============================================================================

#[derive(Debug, Serialize)]
struct RunManifest {
    generated_at: DateTime<Utc>,
    project: String,
    summary: BatchSummary,
    outputs: Vec<ManifestEntry>,
    failed: Vec<FailedWell>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    well_id: String,
    cleaned: PathBuf,
    report: PathBuf,
    removed: usize,
}

#[derive(Debug, Serialize)]
struct FailedWell {
    well_id: String,
    error: String,
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_clean(
    well_paths: &[PathBuf],
    layer_source: &LayerSource,
    config_path: Option<&Path>,
    out_dir: &Path,
    truncate_padding: Option<f64>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => QcConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => QcConfig::load(),
    };
    if let Some(padding) = truncate_padding {
        config.pipeline.truncate_to_layers = true;
        config.pipeline.truncate_padding_m = padding;
        config.validate().context("Invalid truncation padding")?;
    }

    let wells = well_paths
        .iter()
        .map(|p| read_json::<Well>(p))
        .collect::<Result<Vec<_>>>()?;
    let table = layer_source.load()?;
    info!(
        project = %config.project.name,
        wells = wells.len(),
        layers = table.len(),
        "Starting cleaning run"
    );

    let pipeline = Pipeline::from_config(&config);
    let outcomes = run_batch(&pipeline, &wells, &table);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut outputs = Vec::new();
    let mut failed = Vec::new();
    for outcome in &outcomes {
        match outcome {
            WellOutcome::Cleaned(result) => {
                let id = result.well.id();
                // NPD well names contain slashes (15/9-F-1)
                let stem = id.replace(['/', '\\'], "_");
                let cleaned = out_dir.join(format!("{stem}.cleaned.json"));
                let report = out_dir.join(format!("{stem}.report.json"));
                write_json(&cleaned, &result.well)?;
                write_json(&report, &result.reports)?;
                outputs.push(ManifestEntry {
                    well_id: id.to_string(),
                    cleaned,
                    report,
                    removed: result.removed_count(),
                });
            }
            WellOutcome::Failed { well_id, error } => failed.push(FailedWell {
                well_id: well_id.clone(),
                error: error.clone(),
            }),
        }
    }

    let manifest = RunManifest {
        generated_at: Utc::now(),
        project: config.project.name.clone(),
        summary: BatchSummary::from_outcomes(&outcomes),
        outputs,
        failed,
    };
    write_json(&out_dir.join("manifest.json"), &manifest)?;

    info!(
        out_dir = %out_dir.display(),
        cleaned = manifest.summary.cleaned,
        failed = manifest.summary.failed,
        "Run complete"
    );

    if manifest.summary.wells > 0 && manifest.summary.cleaned == 0 {
        bail!("No well could be cleaned, see manifest.json for the errors");
    }
    Ok(())
}

fn run_stats(well_path: &Path, layer_source: &LayerSource, curve: &str) -> Result<()> {
    let well: Well = read_json(well_path)?;
    let table = layer_source.load()?;
    let layers = table.for_well(well.id());

    let stats = describe_layers(&well, curve, &layers)
        .with_context(|| format!("Cannot describe {curve} on well {}", well.id()))?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let warnings = validate_unknown_keys(&contents);
    for w in &warnings {
        println!("warning: {w}");
    }

    let config: QcConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let (errors, range_warnings) = validate_physical_ranges(&config);
    for w in &range_warnings {
        println!("warning: {w}");
    }
    for e in &errors {
        println!("error: {e}");
    }
    if !errors.is_empty() {
        bail!("{} has {} invalid value(s)", path.display(), errors.len());
    }

    println!(
        "{} is valid ({} warning(s)). Effective configuration:\n",
        path.display(),
        warnings.len() + range_warnings.len()
    );
    println!("{}", config.to_toml_string()?);
    Ok(())
}

// ============================================================================
// File helpers
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match &args.command {
        SubCommand::Clean {
            wells,
            layers,
            config,
            out_dir,
            truncate_padding,
        } => run_clean(wells, layers, config.as_deref(), out_dir, *truncate_padding),
        SubCommand::Stats {
            well,
            layers,
            curve,
        } => run_stats(well, layers, curve),
        SubCommand::CheckConfig { path } => run_check_config(path),
    }
}
