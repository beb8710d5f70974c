//! One-hot encoding and alignment to the model's column schema.
//!
//! Alignment is deliberately lossy: an expected column with no encoded value
//! becomes 0, and an encoded column the model was not trained on is dropped.
//! An unseen category therefore yields all-zero indicators for its feature
//! instead of an error.

use crate::types::feature::{FeatureValue, ScaledRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Separator between a column name and its category in indicator names
pub const INDICATOR_SEPARATOR: char = '_';

/// One row in the model's column space, ordered like the expected schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl EncodedVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }
}

/// What alignment had to approximate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignmentReport {
    /// Expected columns with no encoded value, set to 0
    pub zero_filled: Vec<String>,
    /// Encoded columns outside the schema, discarded
    pub dropped: Vec<String>,
}

/// Indicator column name for `value` of categorical `column`
pub fn indicator_name(column: &str, value: &str) -> String {
    format!("{}{}{}", column, INDICATOR_SEPARATOR, value)
}

/// Expand categorical values into indicator columns; numbers pass through.
pub fn encode(record: &ScaledRecord) -> BTreeMap<String, f64> {
    record
        .iter()
        .map(|(name, value)| match value {
            FeatureValue::Numeric(v) => (name.to_string(), *v),
            FeatureValue::Categorical(category) => (indicator_name(name, category), 1.0),
        })
        .collect()
}

/// Reindex encoded columns onto `expected_columns`, zero-filling gaps.
pub fn align(
    encoded: &BTreeMap<String, f64>,
    expected_columns: &[String],
) -> (EncodedVector, AlignmentReport) {
    let mut report = AlignmentReport::default();

    let values = expected_columns
        .iter()
        .map(|column| match encoded.get(column) {
            Some(v) => *v,
            None => {
                report.zero_filled.push(column.clone());
                0.0
            }
        })
        .collect();

    let expected: std::collections::HashSet<&str> =
        expected_columns.iter().map(String::as_str).collect();
    report.dropped = encoded
        .keys()
        .filter(|k| !expected.contains(k.as_str()))
        .cloned()
        .collect();

    (
        EncodedVector {
            columns: expected_columns.to_vec(),
            values,
        },
        report,
    )
}

/// Encode and align in one step, returning what was approximated.
pub fn encode_and_align_with_report(
    record: &ScaledRecord,
    expected_columns: &[String],
) -> (EncodedVector, AlignmentReport) {
    let encoded = encode(record);
    let (vector, report) = align(&encoded, expected_columns);

    if !report.dropped.is_empty() {
        debug!(dropped = ?report.dropped, "Encoded columns not in model schema were dropped");
    }
    debug!(
        columns = vector.len(),
        zero_filled = report.zero_filled.len(),
        "Feature vector aligned"
    );

    (vector, report)
}

/// Encode and align, discarding the report.
pub fn encode_and_align(record: &ScaledRecord, expected_columns: &[String]) -> EncodedVector {
    encode_and_align_with_report(record, expected_columns).0
}
