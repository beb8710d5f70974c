//! Single-shot inference against the loaded classifier

use crate::error::{PredictorError, Result};
use crate::features::encoder::EncodedVector;
use crate::models::classifier::Classifier;
use crate::models::loader::AssetBundle;
use crate::types::prediction::PredictionResult;
use std::sync::Arc;
use tracing::debug;

/// Allowed distance between the probability sum and 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Runs the classifier on aligned feature vectors.
///
/// No retries and no fallback: a failed call fails the request.
pub struct InferenceEngine {
    model: Arc<dyn Classifier>,
    class_labels: Vec<String>,
}

impl InferenceEngine {
    pub fn new(model: Arc<dyn Classifier>, class_labels: Vec<String>) -> Self {
        Self {
            model,
            class_labels,
        }
    }

    pub fn from_bundle(bundle: &AssetBundle) -> Self {
        Self::new(bundle.model.clone(), bundle.class_labels.clone())
    }

    /// Predict the class and class probabilities for one aligned row
    pub fn predict(&self, vector: &EncodedVector) -> Result<PredictionResult> {
        let features = vector.values();

        if let Some(n) = self.model.n_features() {
            if n != features.len() {
                return Err(PredictorError::Inference(format!(
                    "model expects {} features, vector has {}",
                    n,
                    features.len()
                )));
            }
        }

        let class_index = self.model.predict(features)?;
        let probabilities = self.model.predict_proba(features)?;
        validate_probabilities(&probabilities, self.class_labels.len())?;

        if class_index >= self.class_labels.len() {
            return Err(PredictorError::Inference(format!(
                "predicted class {} has no label ({} labels)",
                class_index,
                self.class_labels.len()
            )));
        }

        debug!(
            model = self.model.name(),
            class_index = class_index,
            label = %self.class_labels[class_index],
            probabilities = ?probabilities,
            "Inference complete"
        );

        Ok(PredictionResult::new(
            class_index,
            probabilities,
            &self.class_labels,
        ))
    }
}

/// Check a distribution is finite, non-negative, one entry per class and
/// sums to 1 within [`PROBABILITY_TOLERANCE`].
pub fn validate_probabilities(probabilities: &[f64], n_classes: usize) -> Result<()> {
    if probabilities.len() != n_classes {
        return Err(PredictorError::Inference(format!(
            "model returned {} probabilities for {} classes",
            probabilities.len(),
            n_classes
        )));
    }
    if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(PredictorError::Inference(format!(
            "invalid class probability {}",
            p
        )));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(PredictorError::Inference(format!(
            "class probabilities sum to {}",
            total
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::encoder::align;
    use crate::models::classifier::SoftmaxRegression;
    use std::collections::BTreeMap;

    struct Broken;

    impl Classifier for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn n_features(&self) -> Option<usize> {
            None
        }
        fn n_classes(&self) -> Option<usize> {
            None
        }
        fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![0.9, 0.9, 0.9])
        }
    }

    fn labels() -> Vec<String> {
        vec!["Dropout".into(), "Enrolled".into(), "Graduate".into()]
    }

    fn vector(values: &[(&str, f64)], schema: &[&str]) -> EncodedVector {
        let encoded: BTreeMap<String, f64> =
            values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let schema: Vec<String> = schema.iter().map(|s| s.to_string()).collect();
        align(&encoded, &schema).0
    }

    #[test]
    fn test_predict_returns_labelled_distribution() {
        let model = SoftmaxRegression {
            coefficients: vec![vec![-2.0, 0.0], vec![0.0, 0.0], vec![2.0, 0.0]],
            intercepts: vec![0.0, 0.0, 0.0],
        };
        let engine = InferenceEngine::new(Arc::new(model), labels());

        let result = engine
            .predict(&vector(&[("grade", 1.5)], &["grade", "debtor"]))
            .unwrap();

        assert_eq!(result.label, "Graduate");
        assert_eq!(result.class_index, 2);
        assert_eq!(result.probabilities.len(), 3);
        assert!((result.probabilities.iter().sum::<f64>() - 1.0).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn test_width_mismatch_is_inference_error() {
        let model = SoftmaxRegression {
            coefficients: vec![vec![1.0; 3]; 3],
            intercepts: vec![0.0; 3],
        };
        let engine = InferenceEngine::new(Arc::new(model), labels());

        let err = engine.predict(&vector(&[], &["a", "b"])).unwrap_err();
        assert!(matches!(err, PredictorError::Inference(_)));
    }

    #[test]
    fn test_invalid_distribution_rejected() {
        let engine = InferenceEngine::new(Arc::new(Broken), labels());
        let err = engine.predict(&vector(&[], &["a"])).unwrap_err();
        assert!(matches!(err, PredictorError::Inference(_)));
    }

    #[test]
    fn test_validate_probabilities() {
        assert!(validate_probabilities(&[0.2, 0.3, 0.5], 3).is_ok());
        assert!(validate_probabilities(&[0.2, 0.3], 3).is_err());
        assert!(validate_probabilities(&[-0.1, 0.6, 0.5], 3).is_err());
        assert!(validate_probabilities(&[f64::NAN, 0.5, 0.5], 3).is_err());
    }
}
