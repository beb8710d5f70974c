//! ONNX Runtime backed classifier

use crate::error::{PredictorError, Result};
use crate::models::classifier::Classifier;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

fn onnx_err(e: impl std::fmt::Display) -> PredictorError {
    PredictorError::Inference(e.to_string())
}

/// Exported classifier run through ONNX Runtime.
///
/// Handles both plain probability tensors and the `seq(map(int64, float))`
/// output that scikit-learn exporters emit by default.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    n_features: Option<usize>,
    n_classes: Option<usize>,
}

impl OnnxClassifier {
    pub fn load(path: &Path, n_features: Option<usize>, n_classes: Option<usize>) -> Result<Self> {
        if !path.exists() {
            return Err(PredictorError::Inference(format!(
                "ONNX model file {} not found",
                path.display()
            )));
        }

        info!(path = %path.display(), "Loading ONNX model");

        let session = Session::builder()
            .map_err(onnx_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_err)?
            .with_intra_threads(1)
            .map_err(onnx_err)?
            .commit_from_file(path)
            .map_err(onnx_err)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_probability".to_string());

        info!(input = %input_name, output = %output_name, "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            n_features,
            n_classes,
        })
    }

    fn extract_probabilities(&self, outputs: &SessionOutputs) -> Result<Vec<f64>> {
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| onnx_err(format!("model has no output {}", self.output_name)))?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            // [batch, classes] or [classes]; batch is always 1 here
            let classes = shape.last().copied().unwrap_or(data.len() as i64) as usize;
            return Ok(data.iter().take(classes).map(|&p| p as f64).collect());
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.extract_from_sequence_map(output);
        }

        Err(onnx_err(format!(
            "unsupported output type for {}",
            self.output_name
        )))
    }

    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<Vec<f64>> {
        let allocator = Allocator::default();
        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(onnx_err)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(onnx_err)?;
        let first = maps
            .first()
            .ok_or_else(|| onnx_err("empty probability sequence"))?;

        let mut pairs = first.try_extract_key_values::<i64, f32>().map_err(onnx_err)?;
        pairs.sort_by_key(|(class, _)| *class);
        debug!(classes = pairs.len(), "Extracted probabilities from seq(map)");
        Ok(pairs.into_iter().map(|(_, p)| p as f64).collect())
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn n_classes(&self) -> Option<usize> {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let row: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let shape = vec![1_i64, row.len() as i64];
        let input = Tensor::from_array((shape, row)).map_err(onnx_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| onnx_err(format!("Lock error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(onnx_err)?;

        self.extract_probabilities(&outputs)
    }
}
