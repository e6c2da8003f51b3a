//! Model training
//!
//! A gradient boosted tree regressor fit on the encoded listing features,
//! evaluated on a seeded hold-out split.

mod config;
mod trainer;
pub mod gradient_boosting;
pub mod metrics;
pub mod split;

pub use config::TrainerConfig;
pub use trainer::{TrainOutput, Trainer};
pub use gradient_boosting::{BoosterConfig, GradientBoostingRegressor};
pub use metrics::EvaluationMetrics;
pub use split::TrainTestSplit;
