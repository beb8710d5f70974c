//! Type definitions for the prediction pipeline

pub mod feature;
pub mod prediction;

pub use feature::{FeatureValue, RawFeatureRecord, ScaledRecord};
pub use prediction::{Outcome, PredictionResult};
