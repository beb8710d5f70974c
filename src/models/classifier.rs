//! Classifier abstraction and the JSON-embedded model kinds.
//!
//! The asset bundle names its model with a `type` tag:
//! - `softmax`: multinomial logistic regression
//! - `forest`: averaged decision trees with class counts at the leaves
//! - `onnx`: an exported ONNX file (requires the `onnx` feature)

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A trained classifier treated as a black box.
pub trait Classifier: Send + Sync {
    /// Short model name for logs
    fn name(&self) -> &str;

    /// Input width, if the model records it
    fn n_features(&self) -> Option<usize>;

    /// Number of output classes, if the model records it
    fn n_classes(&self) -> Option<usize>;

    /// Probability per class for one row
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;

    /// Predicted class index for one row
    fn predict(&self, features: &[f64]) -> Result<usize> {
        argmax(&self.predict_proba(features)?)
    }
}

/// Index of the largest probability; ties resolve to the lowest index.
pub fn argmax(probabilities: &[f64]) -> Result<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in probabilities.iter().enumerate() {
        if p.is_nan() {
            return Err(PredictorError::Inference(format!(
                "probability for class {} is NaN",
                i
            )));
        }
        match best {
            Some((_, b)) if p <= b => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| PredictorError::Inference("model returned no classes".to_string()))
}

/// Model section of the asset bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Softmax(SoftmaxRegression),
    Forest(DecisionForest),
    Onnx {
        /// Model file, relative to the bundle file
        path: PathBuf,
        #[serde(default)]
        n_features: Option<usize>,
        #[serde(default)]
        n_classes: Option<usize>,
    },
}

impl ModelSpec {
    /// Validate and instantiate the classifier.
    ///
    /// `bundle_path` locates files the model references and names the
    /// bundle in errors.
    pub fn build(self, bundle_path: &Path) -> Result<Arc<dyn Classifier>> {
        let invalid = |reason: String| PredictorError::AssetInvalid {
            path: bundle_path.to_path_buf(),
            reason,
        };

        match self {
            ModelSpec::Softmax(model) => {
                model.validate().map_err(invalid)?;
                Ok(Arc::new(model))
            }
            ModelSpec::Forest(model) => {
                model.validate().map_err(invalid)?;
                Ok(Arc::new(model))
            }
            ModelSpec::Onnx {
                path,
                n_features,
                n_classes,
            } => {
                let base = bundle_path.parent().unwrap_or_else(|| Path::new("."));
                build_onnx(&base.join(path), n_features, n_classes).map_err(|e| match e {
                    PredictorError::Inference(reason) => invalid(reason),
                    other => other,
                })
            }
        }
    }
}

#[cfg(feature = "onnx")]
fn build_onnx(
    path: &Path,
    n_features: Option<usize>,
    n_classes: Option<usize>,
) -> Result<Arc<dyn Classifier>> {
    let model = crate::models::onnx::OnnxClassifier::load(path, n_features, n_classes)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn build_onnx(
    path: &Path,
    _n_features: Option<usize>,
    _n_classes: Option<usize>,
) -> Result<Arc<dyn Classifier>> {
    Err(PredictorError::Inference(format!(
        "model {} is ONNX but this build lacks the `onnx` feature",
        path.display()
    )))
}

/// Multinomial logistic regression.
///
/// A single coefficient row is read as a binary model (sigmoid), the way
/// scikit-learn stores two-class logistic regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    /// Shape: [class][feature]
    pub coefficients: Vec<Vec<f64>>,
    /// Shape: [class]
    pub intercepts: Vec<f64>,
}

impl SoftmaxRegression {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("softmax model has no coefficient rows".to_string());
        }
        if self.intercepts.len() != self.coefficients.len() {
            return Err(format!(
                "softmax intercepts len {} != coefficient rows {}",
                self.intercepts.len(),
                self.coefficients.len()
            ));
        }
        let width = self.coefficients[0].len();
        if width == 0 {
            return Err("softmax coefficient rows are empty".to_string());
        }
        for (idx, row) in self.coefficients.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "softmax row[{idx}] has {} coefficients, expected {width}",
                    row.len()
                ));
            }
            if row.iter().any(|w| !w.is_finite()) {
                return Err(format!("softmax row[{idx}] has non-finite coefficients"));
            }
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.coefficients.first().map(Vec::len).unwrap_or(0)
    }
}

impl Classifier for SoftmaxRegression {
    fn name(&self) -> &str {
        "softmax"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.width())
    }

    fn n_classes(&self) -> Option<usize> {
        Some(self.coefficients.len().max(2))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.width() {
            return Err(PredictorError::Inference(format!(
                "expected {} features, got {}",
                self.width(),
                features.len()
            )));
        }

        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        if logits.len() == 1 {
            let p = 1.0 / (1.0 + (-logits[0]).exp());
            return Ok(vec![1.0 - p, p]);
        }

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}

/// One node of a decision tree: a threshold split or a leaf with class counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        /// Taken when `x[feature] <= threshold`
        left: usize,
        right: usize,
    },
    Leaf {
        counts: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node 0 is the root
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf_distribution(&self, features: &[f64]) -> Result<Vec<f64>> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer hops than it has nodes
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| {
                        PredictorError::Inference(format!("split on missing feature {}", feature))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { counts }) => {
                    let total: f64 = counts.iter().sum();
                    if total <= 0.0 {
                        return Err(PredictorError::Inference(format!(
                            "leaf {} has no samples",
                            idx
                        )));
                    }
                    return Ok(counts.iter().map(|c| c / total).collect());
                }
                None => {
                    return Err(PredictorError::Inference(format!(
                        "tree references missing node {}",
                        idx
                    )))
                }
            }
        }
        Err(PredictorError::Inference("tree contains a cycle".to_string()))
    }
}

/// Random-forest style ensemble: class distributions averaged over trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl DecisionForest {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.n_classes == 0 {
            return Err("forest n_classes must be > 0".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree[{t}] has no nodes"));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!(
                                "tree[{t}] node[{n}] splits on feature {feature} of {}",
                                self.n_features
                            ));
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(format!("tree[{t}] node[{n}] has a dangling child"));
                        }
                    }
                    TreeNode::Leaf { counts } => {
                        if counts.len() != self.n_classes {
                            return Err(format!(
                                "tree[{t}] node[{n}] has {} class counts, expected {}",
                                counts.len(),
                                self.n_classes
                            ));
                        }
                        if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
                            return Err(format!("tree[{t}] node[{n}] has invalid counts"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Classifier for DecisionForest {
    fn name(&self) -> &str {
        "forest"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn n_classes(&self) -> Option<usize> {
        Some(self.n_classes)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features {
            return Err(PredictorError::Inference(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let dist = tree.leaf_distribution(features)?;
            for (acc, p) in sum.iter_mut().zip(dist) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(sum.into_iter().map(|s| s / n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    counts: vec![8.0, 2.0, 0.0],
                },
                TreeNode::Leaf {
                    counts: vec![0.0, 1.0, 3.0],
                },
            ],
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let model = SoftmaxRegression {
            coefficients: vec![vec![1.0, -1.0], vec![0.0, 0.5], vec![-1.0, 1.0]],
            intercepts: vec![0.1, 0.0, -0.1],
        };
        model.validate().unwrap();

        let proba = model.predict_proba(&[2.0, 1.0]).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(model.predict(&[2.0, 1.0]).unwrap(), 0);
    }

    #[test]
    fn test_binary_softmax_uses_sigmoid() {
        let model = SoftmaxRegression {
            coefficients: vec![vec![0.0]],
            intercepts: vec![0.0],
        };
        assert_eq!(model.predict_proba(&[3.0]).unwrap(), vec![0.5, 0.5]);
        assert_eq!(model.n_classes(), Some(2));
    }

    #[test]
    fn test_softmax_rejects_wrong_width() {
        let model = SoftmaxRegression {
            coefficients: vec![vec![1.0, 1.0], vec![1.0, 1.0]],
            intercepts: vec![0.0, 0.0],
        };
        assert!(matches!(
            model.predict_proba(&[1.0]),
            Err(PredictorError::Inference(_))
        ));
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = DecisionForest {
            n_features: 1,
            n_classes: 3,
            trees: vec![stump(0.0), stump(10.0)],
        };
        forest.validate().unwrap();

        // First stump goes right, second goes left
        let proba = forest.predict_proba(&[5.0]).unwrap();
        assert!((proba[0] - 0.4).abs() < 1e-12);
        assert!((proba[1] - 0.225).abs() < 1e-12);
        assert!((proba[2] - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_forest_validation_catches_dangling_child() {
        let mut tree = stump(0.0);
        tree.nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 0.0,
            left: 1,
            right: 7,
        };
        let forest = DecisionForest {
            n_features: 1,
            n_classes: 3,
            trees: vec![tree],
        };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_model_spec_tagging() {
        let spec: ModelSpec = serde_json::from_str(
            r#"{"type": "softmax", "coefficients": [[1.0], [2.0]], "intercepts": [0.0, 0.0]}"#,
        )
        .unwrap();
        let model = spec.build(Path::new("bundle.json")).unwrap();
        assert_eq!(model.name(), "softmax");
        assert_eq!(model.n_features(), Some(1));

        let tree: ModelSpec = serde_json::from_str(
            r#"{"type": "forest", "n_features": 1, "n_classes": 2,
                "trees": [{"nodes": [
                    {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                    {"counts": [3, 1]},
                    {"counts": [0, 4]}
                ]}]}"#,
        )
        .unwrap();
        let model = tree.build(Path::new("bundle.json")).unwrap();
        assert_eq!(model.predict(&[1.0]).unwrap(), 1);
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]).unwrap(), 0);
        assert!(argmax(&[]).is_err());
        assert!(argmax(&[0.1, f64::NAN]).is_err());
    }
}
