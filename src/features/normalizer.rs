//! Applies the fitted scaler to the numeric columns of a record.

use crate::error::{PredictorError, Result};
use crate::models::scaler::FittedScaler;
use crate::types::feature::{FeatureValue, RawFeatureRecord, ScaledRecord};

/// Scales `numeric_columns` in place; every other column passes through.
pub struct Normalizer {
    scaler: FittedScaler,
    numeric_columns: Vec<String>,
}

impl Normalizer {
    pub fn new(scaler: FittedScaler, numeric_columns: Vec<String>) -> Self {
        Self {
            scaler,
            numeric_columns,
        }
    }

    /// Normalize one record.
    ///
    /// Fails if a numeric column is absent, categorical, or not finite, or if
    /// the scaler was fitted on different columns.
    pub fn normalize(&self, mut record: RawFeatureRecord) -> Result<ScaledRecord> {
        self.scaler.check_columns(&self.numeric_columns)?;

        let row = self
            .numeric_columns
            .iter()
            .map(|name| match record.get(name) {
                Some(FeatureValue::Numeric(v)) if v.is_finite() => Ok(*v),
                Some(FeatureValue::Numeric(v)) => Err(PredictorError::Scaling(format!(
                    "column {} has non-finite value {}",
                    name, v
                ))),
                Some(FeatureValue::Categorical(s)) => Err(PredictorError::Scaling(format!(
                    "column {} is numeric but holds {:?}",
                    name, s
                ))),
                None => Err(PredictorError::Scaling(format!("column {} is missing", name))),
            })
            .collect::<Result<Vec<f64>>>()?;

        let scaled = self.scaler.transform(&row)?;

        for (name, value) in self.numeric_columns.iter().zip(scaled) {
            record.insert(name.as_str(), FeatureValue::Numeric(value));
        }

        Ok(ScaledRecord::new(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(
            FittedScaler::new(vec![120.0, 20.0], vec![20.0, 4.0]),
            vec!["Admission_grade".to_string(), "Age_at_enrollment".to_string()],
        )
    }

    fn record() -> RawFeatureRecord {
        [
            ("Admission_grade", FeatureValue::Numeric(140.0)),
            ("Age_at_enrollment", FeatureValue::Numeric(18.0)),
            ("Gender", FeatureValue::Numeric(1.0)),
            ("Course", FeatureValue::from("9500")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_scales_only_numeric_columns() {
        let scaled = normalizer().normalize(record()).unwrap();

        assert_eq!(scaled.get("Admission_grade"), Some(&FeatureValue::Numeric(1.0)));
        assert_eq!(scaled.get("Age_at_enrollment"), Some(&FeatureValue::Numeric(-0.5)));
        assert_eq!(scaled.get("Gender"), Some(&FeatureValue::Numeric(1.0)));
        assert_eq!(scaled.get("Course"), Some(&FeatureValue::from("9500")));
    }

    #[test]
    fn test_deterministic() {
        let n = normalizer();
        let a = n.normalize(record()).unwrap();
        let b = n.normalize(record()).unwrap();

        for ((_, x), (_, y)) in a.iter().zip(b.iter()) {
            match (x, y) {
                (FeatureValue::Numeric(x), FeatureValue::Numeric(y)) => {
                    assert_eq!(x.to_bits(), y.to_bits())
                }
                _ => assert_eq!(x, y),
            }
        }
    }

    #[test]
    fn test_missing_column_is_scaling_error() {
        let mut rec = RawFeatureRecord::new();
        rec.insert("Admission_grade", FeatureValue::Numeric(140.0));

        let err = normalizer().normalize(rec).unwrap_err();
        assert!(matches!(err, PredictorError::Scaling(_)));
    }

    #[test]
    fn test_categorical_in_numeric_column_is_scaling_error() {
        let mut rec = record();
        rec.insert("Age_at_enrollment", FeatureValue::from("twenty"));

        assert!(matches!(
            normalizer().normalize(rec),
            Err(PredictorError::Scaling(_))
        ));
    }

    #[test]
    fn test_scaler_width_mismatch() {
        let n = Normalizer::new(
            FittedScaler::new(vec![0.0], vec![1.0]),
            vec!["Admission_grade".to_string(), "Age_at_enrollment".to_string()],
        );
        assert!(matches!(n.normalize(record()), Err(PredictorError::Scaling(_))));
    }
}
