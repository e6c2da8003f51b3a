//! autoprice CLI
//!
//! Command-line interface for training, prediction, full pipeline runs and
//! inventory sync over JSON export files.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifacts::{LocalArtifactStore, MetricsHistory};
use crate::data::{apply_sync, load_records, save_records, ListingRecord, STATUS_ACTIVE};
use crate::inference::{write_back, JsonFileSink, Predictor};
use crate::pipeline::{run_pipeline, PipelineConfig};
use crate::training::{EvaluationMetrics, Trainer};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn print_metrics(metrics: &EvaluationMetrics) {
    println!();
    println!("  {:<16} {}", muted("MAE"), format!("{:.2}", metrics.mae).white().bold());
    println!("  {:<16} {}", muted("RMSE"), format!("{:.2}", metrics.rmse).white().bold());
    println!("  {:<16} {}", muted("R²"), format!("{:.4}", metrics.r2).white().bold());
    println!();
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "autoprice")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Used-vehicle price model: train, predict and sync inventory exports")]
#[command(long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Artifact directory (overrides the config file)
    #[arg(long, global = true, env = "AUTOPRICE_ARTIFACT_DIR")]
    pub artifacts: Option<PathBuf>,

    /// JSON pipeline configuration file
    #[arg(long, global = true, env = "AUTOPRICE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the price model on a JSON array of listings
    Train {
        /// Inventory export file
        #[arg(short, long, env = "AUTOPRICE_DATA")]
        data: PathBuf,
    },

    /// Predict prices with the stored model
    Predict {
        /// Inventory export file
        #[arg(short, long, env = "AUTOPRICE_DATA")]
        data: PathBuf,

        /// Prediction file, upserted by vin
        #[arg(short, long, env = "AUTOPRICE_OUTPUT")]
        output: PathBuf,
    },

    /// Retrain, predict and write back in one run
    Run {
        /// Inventory export file
        #[arg(short, long, env = "AUTOPRICE_DATA")]
        data: PathBuf,

        /// Prediction file, upserted by vin
        #[arg(short, long, env = "AUTOPRICE_OUTPUT")]
        output: PathBuf,
    },

    /// Merge a fresh scrape into an inventory file
    Sync {
        /// Current inventory file (missing means empty)
        #[arg(long)]
        existing: PathBuf,

        /// Freshly scraped listings
        #[arg(long)]
        incoming: PathBuf,

        /// Merged inventory output
        #[arg(short, long)]
        output: PathBuf,

        /// Retrain and predict on the active inventory afterwards, writing predictions here
        #[arg(long, value_name = "PREDICTIONS")]
        run: Option<PathBuf>,
    },

    /// Show the latest recorded metrics
    Metrics,
}

/// Config file (or defaults) with CLI overrides applied
pub fn resolve_config(global: &GlobalArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = match &global.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &global.artifacts {
        config.artifact_dir = dir.clone();
    }
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(config: &PipelineConfig, data_path: &Path) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading listings");
    let records = load_records(data_path)?;
    step_done(&format!("{} records", records.len()));

    let store = LocalArtifactStore::new(&config.artifact_dir);
    step_run(&format!(
        "Training {} rounds",
        config.trainer.booster.n_estimators.to_string().cyan()
    ));
    let start = Instant::now();
    let output = Trainer::new(config.trainer.clone(), config.preprocessing.clone(), &store).train(&records)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_metrics(&output.metrics);
    println!("  {:<16} {}", muted("Artifacts"), config.artifact_dir.display().to_string().white());
    println!();
    Ok(())
}

pub fn cmd_predict(config: &PipelineConfig, data_path: &Path, output_path: &Path) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading listings");
    let records = load_records(data_path)?;
    step_done(&format!("{} records", records.len()));

    let store = LocalArtifactStore::new(&config.artifact_dir);
    step_run("Predicting");
    let start = Instant::now();
    let predictions = Predictor::new(config.preprocessing.clone(), &store).predict(&records)?;
    step_done(&format!("{:?}", start.elapsed()));

    let mut sink = JsonFileSink::new(output_path);
    let report = write_back(&predictions, &mut sink)?;

    println!();
    println!("  {:<16} {}", muted("Written"), report.written.to_string().white().bold());
    if report.skipped > 0 {
        println!("  {:<16} {}", muted("Skipped"), format!("{} (no vin)", report.skipped).yellow());
    }
    println!("  {:<16} {}", muted("Output"), output_path.display().to_string().white());
    println!();
    Ok(())
}

pub fn cmd_run(config: &PipelineConfig, data_path: &Path, output_path: &Path) -> anyhow::Result<()> {
    section("Pipeline");

    step_run("Loading listings");
    let records = load_records(data_path)?;
    step_done(&format!("{} records", records.len()));

    let store = LocalArtifactStore::new(&config.artifact_dir);
    let mut sink = JsonFileSink::new(output_path);

    step_run("Retraining and predicting");
    let start = Instant::now();
    let report = run_pipeline(&records, config, &store, &mut sink)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_metrics(&report.metrics);
    println!("  {:<16} {}", muted("Trained on"), report.trained_on.to_string().white());
    println!("  {:<16} {}", muted("Written"), report.write_back.written.to_string().white().bold());
    if report.write_back.skipped > 0 {
        println!("  {:<16} {}", muted("Skipped"), format!("{} (no vin)", report.write_back.skipped).yellow());
    }
    println!();
    Ok(())
}

pub fn cmd_sync(
    config: &PipelineConfig,
    existing_path: &Path,
    incoming_path: &Path,
    output_path: &Path,
    predictions_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Sync");

    let existing = if existing_path.exists() {
        load_records(existing_path)?
    } else {
        Vec::new()
    };
    let incoming = load_records(incoming_path)?;

    let (merged, plan) = apply_sync(&existing, &incoming);
    save_records(output_path, &merged)?;

    println!("  {:<16} {}", muted("Added"), plan.added.len().to_string().green());
    println!("  {:<16} {}", muted("Updated"), plan.updated.len().to_string().white());
    println!("  {:<16} {}", muted("Removed"), plan.removed.len().to_string().red());
    println!("  {:<16} {}", muted("Inventory"), merged.len().to_string().white().bold());
    println!();

    let Some(predictions_path) = predictions_path else {
        return Ok(());
    };

    let active: Vec<ListingRecord> = merged
        .into_iter()
        .filter(|r| r.status.as_deref() == Some(STATUS_ACTIVE))
        .collect();
    let store = LocalArtifactStore::new(&config.artifact_dir);
    let mut sink = JsonFileSink::new(predictions_path);

    step_run(&format!("Retraining on {} active listings", active.len()));
    let start = Instant::now();
    let report = run_pipeline(&active, config, &store, &mut sink)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_metrics(&report.metrics);
    println!("  {:<16} {}", muted("Written"), report.write_back.written.to_string().white().bold());
    println!();
    Ok(())
}

pub fn cmd_metrics(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Metrics");

    let store = LocalArtifactStore::new(&config.artifact_dir);
    match MetricsHistory::latest(&store)? {
        Some(entry) => {
            println!("  {:<16} {}", muted("Trained at"), entry.timestamp.to_rfc3339().white());
            print_metrics(&entry.metrics);
        }
        None => {
            println!("  {}", "No training run recorded yet".yellow());
            println!();
        }
    }
    Ok(())
}
