//! Listing preprocessing
//!
//! Turns raw listing records into a numeric feature matrix:
//! - Title parsing (`year`, `make`, `model` from free text)
//! - Missing value imputation (median at training time, constants at inference)
//! - Standard scaling of numeric columns
//! - One-hot encoding of categorical columns, ignoring unseen levels

mod config;
mod imputer;
mod scaler;
mod encoder;
mod transform;
mod pipeline;
pub mod title;

pub use config::PreprocessingConfig;
pub use imputer::{Imputer, ImputeStrategy};
pub use scaler::{ScalerParams, StandardScaler};
pub use encoder::OneHotEncoder;
pub use transform::EncodingTransform;
pub use pipeline::{FeatureFrame, FeaturePreprocessor, PreprocessOutput};
pub use title::{parse_title, ParsedTitle};

use serde::{Deserialize, Serialize};

/// Numeric feature columns, in encoding order
pub const NUMERICAL_FEATURES: [&str; 2] = ["year", "mileage"];

/// Categorical feature columns, in encoding order
pub const CATEGORICAL_FEATURES: [&str; 4] = ["make", "model", "fuelType", "transmission"];

/// Column the model learns to predict
pub const TARGET_COLUMN: &str = "price";

/// Whether a batch is used to fit the encoding or only to apply it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreprocessMode {
    Training,
    Inference,
}

impl std::fmt::Display for PreprocessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Inference => write!(f, "inference"),
        }
    }
}
