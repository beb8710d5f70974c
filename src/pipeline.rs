//! End-to-end prediction: assemble, normalize, encode and align, infer.

use crate::error::Result;
use crate::features::assembler::FeatureAssembler;
use crate::features::encoder::{encode_and_align_with_report, AlignmentReport, EncodedVector};
use crate::features::normalizer::Normalizer;
use crate::metrics::PredictionMetrics;
use crate::models::inference::InferenceEngine;
use crate::models::loader::AssetBundle;
use crate::types::feature::FeatureValue;
use crate::types::prediction::PredictionResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs one synchronous prediction per call against a shared bundle.
///
/// Calls are independent; nothing is carried between requests.
pub struct Predictor {
    bundle: Arc<AssetBundle>,
    assembler: FeatureAssembler,
    normalizer: Normalizer,
    engine: InferenceEngine,
    metrics: Option<Arc<PredictionMetrics>>,
}

impl Predictor {
    pub fn new(bundle: Arc<AssetBundle>) -> Self {
        Self {
            assembler: FeatureAssembler::new(bundle.defaults.clone()),
            normalizer: Normalizer::new(bundle.scaler.clone(), bundle.numeric_columns.clone()),
            engine: InferenceEngine::from_bundle(&bundle),
            bundle,
            metrics: None,
        }
    }

    /// Record every prediction in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<PredictionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn bundle(&self) -> &AssetBundle {
        &self.bundle
    }

    /// Turn user input into the model's feature row.
    pub fn prepare(
        &self,
        user_values: &HashMap<String, FeatureValue>,
    ) -> Result<(EncodedVector, AlignmentReport)> {
        let record = self.assembler.assemble(user_values);
        let scaled = self.normalizer.normalize(record)?;
        Ok(encode_and_align_with_report(
            &scaled,
            &self.bundle.expected_columns,
        ))
    }

    /// Predict and return the alignment report alongside the result.
    pub fn predict_with_report(
        &self,
        user_values: &HashMap<String, FeatureValue>,
    ) -> Result<(PredictionResult, AlignmentReport)> {
        let start = Instant::now();

        let outcome = self
            .prepare(user_values)
            .and_then(|(vector, report)| Ok((self.engine.predict(&vector)?, report)));

        match &outcome {
            Ok((result, report)) => {
                let elapsed = start.elapsed();
                if let Some(metrics) = &self.metrics {
                    metrics.record_prediction(elapsed, &result.label, report.dropped.len());
                }
                info!(
                    prediction_id = %result.prediction_id,
                    label = %result.label,
                    probabilities = ?result.probabilities,
                    processing_time_us = elapsed.as_micros(),
                    "Prediction served"
                );
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(e.kind());
                }
                warn!(error = %e, kind = e.kind(), "Prediction failed");
            }
        }

        outcome
    }

    /// Predict the class and probabilities for one submission.
    pub fn predict(&self, user_values: &HashMap<String, FeatureValue>) -> Result<PredictionResult> {
        self.predict_with_report(user_values).map(|(result, _)| result)
    }
}
