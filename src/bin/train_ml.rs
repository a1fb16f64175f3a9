//! Offline trainer for the risk and APY-trend forests.
//!
//! Generates seeded synthetic datasets, reports hold-out error, then refits
//! on all rows and writes both artifacts to the model directory.
//!
//! # Usage
//! ```sh
//! cargo run --bin train_ml -- --model-dir models --seed 42
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use defi_forecast::application::ml::synthetic::SyntheticDataGenerator;
use defi_forecast::application::ml::training::{evaluate, fit_artifact};
use defi_forecast::application::ml::{
    ForestParams, Predictor, RegressionReport, RiskPredictor, TrendPredictor,
};
use defi_forecast::domain::ml::PredictorKind;
use defi_forecast::infrastructure::persistence::FileModelStore;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the trained artifacts are written to
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// RNG seed for the synthetic datasets
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of synthetic risk rows
    #[arg(long, default_value_t = 1000)]
    risk_samples: usize,

    /// Number of synthetic APY sequences
    #[arg(long, default_value_t = 500)]
    apy_sequences: usize,

    /// Length of each synthetic APY sequence
    #[arg(long, default_value_t = 30)]
    sequence_length: usize,

    /// Number of trees in each random forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum depth of the risk trees
    #[arg(long, default_value_t = 10)]
    risk_max_depth: u16,

    /// Maximum depth of the APY trees
    #[arg(long, default_value_t = 8)]
    trend_max_depth: u16,

    /// Minimum samples required to split an internal node
    #[arg(long, default_value_t = 2)]
    min_split: usize,

    /// Skip the 80/20 hold-out evaluation
    #[arg(long)]
    no_split: bool,

    /// Directory to dump the generated datasets as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let risk_params = ForestParams {
        n_trees: args.n_trees,
        max_depth: args.risk_max_depth,
        min_samples_split: args.min_split,
    };
    let trend_params = ForestParams {
        n_trees: args.n_trees,
        max_depth: args.trend_max_depth,
        min_samples_split: args.min_split,
    };

    info!("Generating synthetic data (seed {})", args.seed);
    let mut generator = SyntheticDataGenerator::new(args.seed);
    let (x_risk, y_risk) = generator.risk_dataset(args.risk_samples);
    let (x_apy, y_apy) = generator.apy_dataset(args.apy_sequences, args.sequence_length);
    println!(
        "Generated {} risk rows and {} APY windows",
        x_risk.len(),
        x_apy.len()
    );

    if let Some(dir) = &args.export_csv {
        export_dataset(dir, PredictorKind::RiskForecaster, "liquidation_risk", &x_risk, &y_risk)?;
        export_dataset(dir, PredictorKind::ApyTrend, "next_apy", &x_apy, &y_apy)?;
    }

    if !args.no_split {
        let report = holdout(PredictorKind::RiskForecaster, &x_risk, &y_risk, risk_params)?;
        print_report("Risk forecaster", &report);
        let report = holdout(PredictorKind::ApyTrend, &x_apy, &y_apy, trend_params)?;
        print_report("APY predictor", &report);
    }

    let store = FileModelStore::new(&args.model_dir);

    let mut risk = RiskPredictor::new(risk_params);
    risk.train(&x_risk, &y_risk)
        .context("Failed to train risk model")?;
    risk.save(&store).context("Failed to save risk model")?;

    let mut trend = TrendPredictor::new(trend_params);
    trend
        .train(&x_apy, &y_apy)
        .context("Failed to train APY model")?;
    trend.save(&store).context("Failed to save APY model")?;

    println!(
        "Final models (trained on all samples) saved to {:?}.",
        store.dir()
    );
    Ok(())
}

/// Fits on the first 80% of rows and scores the remaining 20%.
fn holdout(
    kind: PredictorKind,
    x: &[Vec<f64>],
    y: &[f64],
    params: ForestParams,
) -> Result<RegressionReport> {
    let split = (x.len() as f64 * 0.8).floor() as usize;
    if split == 0 || split == x.len() {
        anyhow::bail!("Not enough {} samples for a hold-out split", kind);
    }

    info!("Hold-out training {} on {} samples...", kind, split);
    let artifact = fit_artifact(kind, &x[..split], &y[..split], params)?;
    Ok(evaluate(&artifact, &x[split..], &y[split..])?)
}

fn print_report(name: &str, report: &RegressionReport) {
    println!("\n{} hold-out ({} samples):", name, report.samples);
    println!("  RMSE: {:.6}", report.rmse);
    println!("  MAE:  {:.6}", report.mae);
    println!("  R²:   {:.4}", report.r2);
}

fn export_dataset(
    dir: &Path,
    kind: PredictorKind,
    label: &str,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(format!("{}_training.csv", kind.label()));
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("Failed to open {:?}", path))?;

    let mut header: Vec<&str> = kind.feature_names().to_vec();
    header.push(label);
    writer.write_record(&header)?;

    for (row, target) in x.iter().zip(y) {
        let record: Vec<String> = row
            .iter()
            .chain(std::iter::once(target))
            .map(|v| v.to_string())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!("Exported {} rows to {:?}", x.len(), path);
    Ok(())
}
