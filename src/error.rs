//! Error types for the autoprice pipeline

use thiserror::Error;

/// Result type alias for autoprice operations
pub type Result<T> = std::result::Result<T, AutoPriceError>;

/// Main error type for the pricing pipeline
#[derive(Error, Debug)]
pub enum AutoPriceError {
    /// A fitted transform or model was requested before any training run produced it
    #[error("Artifact missing: {0} (run training first)")]
    ArtifactMissing(String),

    #[error("Data error: {0}")]
    DataError(String),

    /// An inference batch lacks feature columns the transform was fit on
    #[error("Schema drift: fitted columns {missing:?} are absent from the batch")]
    SchemaDrift { missing: Vec<String> },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<polars::error::PolarsError> for AutoPriceError {
    fn from(err: polars::error::PolarsError) -> Self {
        AutoPriceError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AutoPriceError {
    fn from(err: serde_json::Error) -> Self {
        AutoPriceError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for AutoPriceError {
    fn from(err: bincode::Error) -> Self {
        AutoPriceError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AutoPriceError {
    fn from(err: ndarray::ShapeError) -> Self {
        AutoPriceError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoPriceError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AutoPriceError = io_err.into();
        assert!(matches!(err, AutoPriceError::IoError(_)));
    }

    #[test]
    fn test_schema_drift_lists_columns() {
        let err = AutoPriceError::SchemaDrift {
            missing: vec!["fuelType".to_string()],
        };
        assert!(err.to_string().contains("fuelType"));
    }
}
