//! Inference
//!
//! Loads the stored transform and model, predicts one price per listing and
//! hands the results to a [`PredictionSink`].

mod predictor;
pub mod writeback;

pub use predictor::{Prediction, Predictor};
pub use writeback::{write_back, JsonFileSink, PredictionSink, WriteBackReport};
