//! Fitted per-column linear scaler

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

/// A scaler fitted at training time: `z = (x - center) / scale` per column.
///
/// Covers standard scaling (`mean`, `std`), robust scaling (median, IQR) and
/// min-max scaling (min, range) alike, since all three are a center and a
/// scale per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedScaler {
    /// Column names in the order the scaler was fitted with, when recorded
    #[serde(default, alias = "feature_names_in")]
    pub feature_names: Option<Vec<String>>,
    /// Per-column center
    #[serde(alias = "mean")]
    pub center: Vec<f64>,
    /// Per-column scale
    #[serde(alias = "std")]
    pub scale: Vec<f64>,
}

impl FittedScaler {
    pub fn new(center: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            feature_names: None,
            center,
            scale,
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.center.len()
    }

    /// Check that the scaler can transform the given columns, in order.
    pub fn check_columns(&self, columns: &[String]) -> Result<()> {
        if self.center.len() != self.scale.len() {
            return Err(PredictorError::Scaling(format!(
                "scaler has {} centers but {} scales",
                self.center.len(),
                self.scale.len()
            )));
        }
        if columns.len() != self.width() {
            return Err(PredictorError::Scaling(format!(
                "scaler was fitted on {} columns, got {}",
                self.width(),
                columns.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if let Some((fitted, given)) = names.iter().zip(columns).find(|(a, b)| a != b) {
                return Err(PredictorError::Scaling(format!(
                    "column order mismatch: scaler expects {} where {} was given",
                    fitted, given
                )));
            }
        }
        Ok(())
    }

    /// Transform one row of numeric values.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() || self.scale.len() != self.width() {
            return Err(PredictorError::Scaling(format!(
                "row has {} values, scaler expects {}",
                row.len(),
                self.width()
            )));
        }

        Ok(row
            .iter()
            .zip(self.center.iter().zip(&self.scale))
            .map(|(&x, (&center, &scale))| {
                // Constant training columns are stored with a zero scale
                let scale = if scale == 0.0 { 1.0 } else { scale };
                (x - center) / scale
            })
            .collect())
    }
}
