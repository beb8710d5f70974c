//! Feature values and per-request feature records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single raw feature value.
///
/// Numbers pass through scaling and encoding unchanged in kind; categories
/// are expanded into indicator columns by the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    /// Numeric payload, if this value is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureValue::Categorical(_))
    }

    /// Convert to a category label, rendering whole numbers without a
    /// fractional part (`1.0` becomes `"1"`).
    pub fn into_categorical(self) -> Self {
        match self {
            FeatureValue::Numeric(v) => FeatureValue::Categorical(category_label(v)),
            categorical => categorical,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{}", v),
            FeatureValue::Categorical(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Numeric(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Numeric(v as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Categorical(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Categorical(v)
    }
}

fn category_label(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// One student's raw (unscaled, unencoded) features, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFeatureRecord {
    values: BTreeMap<String, FeatureValue>,
}

impl RawFeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    /// Insert or overwrite a value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: FeatureValue) -> Option<FeatureValue> {
        self.values.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, FeatureValue)> for RawFeatureRecord {
    fn from_iter<I: IntoIterator<Item = (K, FeatureValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A record whose numeric columns have been normalized.
///
/// Only [`Normalizer`](crate::features::Normalizer) produces these.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledRecord(RawFeatureRecord);

impl ScaledRecord {
    pub(crate) fn new(record: RawFeatureRecord) -> Self {
        Self(record)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
