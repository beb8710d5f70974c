//! Shared handler state

use crate::error::Result;
use crate::metrics::PredictionMetrics;
use crate::models::loader::{AssetBundle, AssetStore};
use crate::pipeline::Predictor;
use crate::web::render::Templates;
use std::sync::Arc;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Once-loaded asset cache
    pub assets: Arc<AssetStore>,

    /// Prediction pipeline over the cached bundle
    pub predictor: Arc<Predictor>,

    /// Prediction metrics
    pub metrics: Arc<PredictionMetrics>,

    /// Page templates
    pub templates: Arc<Templates>,
}

impl AppState {
    /// Load the bundle (or reuse the cached one) and build the pipeline.
    pub fn new(
        assets: Arc<AssetStore>,
        metrics: Arc<PredictionMetrics>,
        templates: Arc<Templates>,
    ) -> Result<Self> {
        let bundle = assets.load()?;
        let predictor = Predictor::new(bundle).with_metrics(metrics.clone());

        Ok(Self {
            assets,
            predictor: Arc::new(predictor),
            metrics,
            templates,
        })
    }

    pub fn bundle(&self) -> &AssetBundle {
        self.predictor.bundle()
    }
}

/// State of the fallback server used when the bundle could not be loaded
#[derive(Clone)]
pub struct UnavailableState {
    pub templates: Arc<Templates>,
    /// Load failure shown on every page
    pub reason: Arc<str>,
}
