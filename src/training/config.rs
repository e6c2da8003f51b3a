//! Training configuration

use super::gradient_boosting::BoosterConfig;
use crate::error::{AutoPriceError, Result};
use serde::{Deserialize, Serialize};

/// Hold-out split and booster settings for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Fraction of labelled rows held out for evaluation
    pub test_size: f64,
    /// Seed of the train/test shuffle
    pub random_state: u64,
    pub booster: BoosterConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            booster: BoosterConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_booster(mut self, booster: BoosterConfig) -> Self {
        self.booster = booster;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AutoPriceError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        self.booster.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.booster.n_estimators, 1000);
        assert_eq!(config.booster.learning_rate, 0.05);
        assert_eq!(config.booster.max_depth, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: TrainerConfig = serde_json::from_str(r#"{"booster": {"n_estimators": 50}}"#).unwrap();
        assert_eq!(config.booster.n_estimators, 50);
        assert_eq!(config.booster.subsample, 0.8);
        assert_eq!(config.test_size, 0.2);
    }

    #[test]
    fn test_invalid_test_size() {
        let config = TrainerConfig::default().with_test_size(1.0);
        assert!(matches!(config.validate(), Err(AutoPriceError::ConfigError(_))));
    }
}
