//! Student Outcome Predictor Library
//!
//! Turns a student's academic and demographic form input into the feature
//! row a pre-trained classifier expects, and reports the predicted outcome
//! (Dropout / Enrolled / Graduate) with class probabilities.

pub mod config;
pub mod error;
pub mod features;
pub mod form;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{PredictorError, Result};
pub use form::StudentForm;
pub use models::loader::{AssetBundle, AssetStore};
pub use pipeline::Predictor;
pub use types::{FeatureValue, Outcome, PredictionResult, RawFeatureRecord};
