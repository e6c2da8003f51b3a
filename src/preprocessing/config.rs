//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Missing-value policy for the feature preprocessor.
///
/// Training fills numeric gaps with the batch median. Inference never looks
/// at its own batch and uses the fixed fallbacks below instead, so single
/// record predictions stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Label substituted for missing categorical values
    pub unknown_label: String,

    /// Year used for missing values at inference time
    pub inference_year_fill: f64,

    /// Mileage used for missing values at inference time
    pub inference_mileage_fill: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            unknown_label: "Unknown".to_string(),
            inference_year_fill: 2020.0,
            inference_mileage_fill: 0.0,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the categorical placeholder
    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_label = label.into();
        self
    }

    /// Builder method to set the inference-time year fallback
    pub fn with_inference_year_fill(mut self, year: f64) -> Self {
        self.inference_year_fill = year;
        self
    }

    /// Builder method to set the inference-time mileage fallback
    pub fn with_inference_mileage_fill(mut self, mileage: f64) -> Self {
        self.inference_mileage_fill = mileage;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessingConfig::default();
        assert_eq!(config.unknown_label, "Unknown");
        assert_eq!(config.inference_year_fill, 2020.0);
        assert_eq!(config.inference_mileage_fill, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PreprocessingConfig =
            serde_json::from_str(r#"{"inference_year_fill": 2018}"#).unwrap();
        assert_eq!(config.inference_year_fill, 2018.0);
        assert_eq!(config.unknown_label, "Unknown");
    }
}
