//! Asset bundle loading and the process-wide bundle cache

use crate::error::{PredictorError, Result};
use crate::models::classifier::{Classifier, ModelSpec};
use crate::models::scaler::FittedScaler;
use crate::types::feature::RawFeatureRecord;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// On-disk layout of the bundle. Keys follow the exported training artifact.
#[derive(Deserialize)]
struct BundleFile {
    model: ModelSpec,
    scaler: FittedScaler,
    #[serde(alias = "expected_columns")]
    features: Vec<String>,
    #[serde(alias = "numeric_columns")]
    numeric_cols: Vec<String>,
    defaults: RawFeatureRecord,
    #[serde(alias = "class_labels")]
    target_names: Vec<String>,
}

/// Everything needed to reproduce the training-time feature schema and
/// run the model. Immutable once loaded.
pub struct AssetBundle {
    /// Trained classifier
    pub model: Arc<dyn Classifier>,
    /// Scaler fitted on `numeric_columns`
    pub scaler: FittedScaler,
    /// Post-encoding column order the model was trained on
    pub expected_columns: Vec<String>,
    /// Columns subject to scaling, in scaler order
    pub numeric_columns: Vec<String>,
    /// Default raw value for every feature
    pub defaults: RawFeatureRecord,
    /// Class names indexed by the model's class index
    pub class_labels: Vec<String>,
    /// File the bundle was read from
    pub source: PathBuf,
}

impl fmt::Debug for AssetBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetBundle")
            .field("model", &self.model.name())
            .field("expected_columns", &self.expected_columns.len())
            .field("numeric_columns", &self.numeric_columns)
            .field("defaults", &self.defaults.len())
            .field("class_labels", &self.class_labels)
            .field("source", &self.source)
            .finish()
    }
}

impl AssetBundle {
    /// Read and validate a bundle file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PredictorError::AssetMissing {
                path: path.to_path_buf(),
            },
            _ => PredictorError::AssetInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        Self::from_json(&contents, path)
    }

    /// Parse and validate bundle JSON; `source` resolves relative model
    /// paths and names the bundle in errors.
    pub fn from_json(json: &str, source: &Path) -> Result<Self> {
        let invalid = |reason: String| PredictorError::AssetInvalid {
            path: source.to_path_buf(),
            reason,
        };

        let file: BundleFile = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;

        if file.features.is_empty() {
            return Err(invalid("expected column list is empty".to_string()));
        }
        if file.target_names.is_empty() {
            return Err(invalid("class label list is empty".to_string()));
        }

        let model = file.model.build(source)?;

        if let Some(n) = model.n_features() {
            if n != file.features.len() {
                return Err(invalid(format!(
                    "model takes {} features but {} expected columns are listed",
                    n,
                    file.features.len()
                )));
            }
        }
        if let Some(n) = model.n_classes() {
            if n != file.target_names.len() {
                return Err(invalid(format!(
                    "model predicts {} classes but {} class labels are listed",
                    n,
                    file.target_names.len()
                )));
            }
        }

        // Mismatches below surface as scaling errors per request
        if file.scaler.width() != file.numeric_cols.len() {
            warn!(
                scaler_width = file.scaler.width(),
                numeric_columns = file.numeric_cols.len(),
                "Scaler width does not match numeric column list"
            );
        }
        for column in &file.numeric_cols {
            if !file.defaults.contains(column) {
                warn!(column = %column, "Numeric column has no default value");
            }
        }

        Ok(Self {
            model,
            scaler: file.scaler,
            expected_columns: file.features,
            numeric_columns: file.numeric_cols,
            defaults: file.defaults,
            class_labels: file.target_names,
            source: source.to_path_buf(),
        })
    }

    /// Numeric default for `name`, if present
    pub fn default_number(&self, name: &str) -> Option<f64> {
        self.defaults.get(name).and_then(|v| v.as_f64())
    }
}

/// Lazily loads the bundle once and hands out the cached instance.
///
/// Concurrent first calls block on the same initialization, so the file is
/// read at most once per successful load.
pub struct AssetStore {
    path: PathBuf,
    cell: OnceCell<Arc<AssetBundle>>,
    loads: AtomicUsize,
}

impl AssetStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the cached bundle, loading it on first use.
    pub fn load(&self) -> Result<Arc<AssetBundle>> {
        self.cell
            .get_or_try_init(|| {
                self.loads.fetch_add(1, Ordering::SeqCst);
                info!(path = %self.path.display(), "Loading asset bundle");

                let bundle = AssetBundle::from_file(&self.path)?;
                info!(
                    model = bundle.model.name(),
                    expected_columns = bundle.expected_columns.len(),
                    numeric_columns = bundle.numeric_columns.len(),
                    classes = ?bundle.class_labels,
                    "Asset bundle loaded"
                );
                Ok(Arc::new(bundle))
            })
            .cloned()
    }

    /// Bundle location
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Number of times the bundle file has been read
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUNDLE: &str = r#"{
        "model": {"type": "softmax",
                  "coefficients": [[1.0, 0.0], [0.0, 1.0]],
                  "intercepts": [0.0, 0.0]},
        "scaler": {"mean": [100.0], "std": [10.0]},
        "features": ["Admission_grade", "Gender"],
        "numeric_cols": ["Admission_grade"],
        "defaults": {"Admission_grade": 120.0, "Gender": 1},
        "target_names": ["Dropout", "Graduate"]
    }"#;

    fn write_bundle(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_is_cached() {
        let file = write_bundle(BUNDLE);
        let store = AssetStore::new(file.path());

        let first = store.load().unwrap();
        let second = store.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.load_count(), 1);
        assert!(store.is_loaded());
    }

    #[test]
    fn test_missing_bundle() {
        let store = AssetStore::new("/nonexistent/dropout_prediction_model.json");
        let err = store.load().unwrap_err();
        assert!(matches!(err, PredictorError::AssetMissing { .. }));
        assert!(err.is_fatal());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_malformed_bundle() {
        let file = write_bundle("{\"model\": 3}");
        let err = AssetBundle::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PredictorError::AssetInvalid { .. }));
    }

    #[test]
    fn test_class_count_mismatch() {
        let json = BUNDLE.replace(r#"["Dropout", "Graduate"]"#, r#"["Dropout", "Enrolled", "Graduate"]"#);
        let err = AssetBundle::from_json(&json, Path::new("bundle.json")).unwrap_err();
        assert!(matches!(err, PredictorError::AssetInvalid { .. }));
    }

    #[test]
    fn test_field_aliases() {
        let json = BUNDLE
            .replace("\"features\"", "\"expected_columns\"")
            .replace("\"target_names\"", "\"class_labels\"");
        let bundle = AssetBundle::from_json(&json, Path::new("bundle.json")).unwrap();
        assert_eq!(bundle.class_labels, vec!["Dropout", "Graduate"]);
        assert_eq!(bundle.default_number("Admission_grade"), Some(120.0));
    }
}
