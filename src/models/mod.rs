//! Model assets and inference components

pub mod classifier;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use classifier::{Classifier, DecisionForest, ModelSpec, SoftmaxRegression};
pub use inference::InferenceEngine;
pub use loader::{AssetBundle, AssetStore};
pub use scaler::FittedScaler;
