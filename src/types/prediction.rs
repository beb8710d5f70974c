//! Prediction result data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome category shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Dropout,
    Enrolled,
    Graduate,
}

impl Outcome {
    /// Map a class label name onto the three display states.
    ///
    /// Any label other than `Dropout` or `Enrolled` is shown as `Graduate`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Dropout" => Outcome::Dropout,
            "Enrolled" => Outcome::Enrolled,
            _ => Outcome::Graduate,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Outcome::Dropout => "Prediction: DROPOUT",
            Outcome::Enrolled => "Prediction: ENROLLED",
            Outcome::Graduate => "Prediction: GRADUATE",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Outcome::Dropout => "High-risk student. Intervene as soon as possible.",
            Outcome::Enrolled => "Student is still on track, keep monitoring.",
            Outcome::Graduate => "Academic performance is very good.",
        }
    }
}

/// Result of one prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Unique prediction identifier
    pub prediction_id: String,

    /// Index of the predicted class
    pub class_index: usize,

    /// Human-readable class label
    pub label: String,

    /// Display category derived from the label
    pub outcome: Outcome,

    /// Probability per class, ordered like the bundle's class labels
    pub probabilities: Vec<f64>,

    /// Class labels the probabilities refer to
    pub class_labels: Vec<String>,

    /// Prediction timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionResult {
    pub fn new(class_index: usize, probabilities: Vec<f64>, class_labels: &[String]) -> Self {
        let label = class_labels
            .get(class_index)
            .cloned()
            .unwrap_or_else(|| class_index.to_string());

        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            class_index,
            outcome: Outcome::from_label(&label),
            label,
            probabilities,
            class_labels: class_labels.to_vec(),
            timestamp: Utc::now(),
        }
    }

    /// Probability of the class at `index`, if the model produced one
    pub fn probability(&self, index: usize) -> Option<f64> {
        self.probabilities.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec![
            "Dropout".to_string(),
            "Enrolled".to_string(),
            "Graduate".to_string(),
        ]
    }

    #[test]
    fn test_outcome_from_label() {
        assert_eq!(Outcome::from_label("Dropout"), Outcome::Dropout);
        assert_eq!(Outcome::from_label("Enrolled"), Outcome::Enrolled);
        assert_eq!(Outcome::from_label("Graduate"), Outcome::Graduate);
        assert_eq!(Outcome::from_label("Transferred"), Outcome::Graduate);
    }

    #[test]
    fn test_prediction_result_serialization() {
        let result = PredictionResult::new(0, vec![0.7, 0.2, 0.1], &labels());

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: PredictionResult = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.label, "Dropout");
        assert_eq!(deserialized.outcome, Outcome::Dropout);
        assert_eq!(deserialized.probabilities, vec![0.7, 0.2, 0.1]);
        assert_eq!(deserialized.prediction_id, result.prediction_id);
    }
}
