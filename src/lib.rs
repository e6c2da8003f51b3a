//! autoprice - used-vehicle price model
//!
//! Batch pipeline that estimates the fair market price of scraped vehicle
//! listings:
//! - Title parsing into year, make and model
//! - Imputation, standard scaling and one-hot encoding of listing features
//! - Gradient boosted tree regression with hold-out evaluation
//! - Prediction and write-back keyed by VIN
//!
//! # Modules
//!
//! - [`data`] - Listing records, export files, inventory sync
//! - [`preprocessing`] - Title parsing and feature encoding
//! - [`training`] - Booster, split, metrics and the training run
//! - [`inference`] - Prediction and write-back
//! - [`artifacts`] - Artifact stores and metrics history
//! - [`pipeline`] - Retrain, predict, write back in one call
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use autoprice::prelude::*;
//!
//! # fn main() -> autoprice::error::Result<()> {
//! let records = load_records("inventory.json")?;
//! let config = PipelineConfig::default();
//! let store = LocalArtifactStore::new(&config.artifact_dir);
//! let mut sink = JsonFileSink::new("predictions.json");
//!
//! let report = run_pipeline(&records, &config, &store, &mut sink)?;
//! println!("R2 = {:.3}", report.metrics.r2);
//! # Ok(())
//! # }
//! ```

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod inference;
pub mod artifacts;
pub mod pipeline;

pub mod cli;

pub use error::{AutoPriceError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactStore, InMemoryArtifactStore, LocalArtifactStore, MetricsHistory};
    pub use crate::data::{apply_sync, apply_sync_at, load_records, plan_sync, save_records, ListingRecord, SyncPlan};
    pub use crate::error::{AutoPriceError, Result};
    pub use crate::inference::{write_back, JsonFileSink, Prediction, PredictionSink, Predictor, WriteBackReport};
    pub use crate::pipeline::{run_pipeline, PipelineConfig, PipelineReport};
    pub use crate::preprocessing::{
        parse_title, EncodingTransform, FeaturePreprocessor, ParsedTitle, PreprocessMode, PreprocessingConfig,
    };
    pub use crate::training::{
        BoosterConfig, EvaluationMetrics, GradientBoostingRegressor, TrainOutput, Trainer, TrainerConfig,
    };
}
