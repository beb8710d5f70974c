//! Student Outcome Predictor - Main Entry Point
//!
//! Loads the asset bundle once, then serves the prediction form over HTTP.
//! Without a usable bundle every page reports the load error instead.

use anyhow::{Context, Result};
use std::sync::Arc;
use student_outcome_predictor::{
    config::{AppConfig, LogFormat},
    metrics::{MetricsReporter, PredictionMetrics},
    web::{create_router, create_unavailable_router, AppState, Templates, UnavailableState},
    AssetStore,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("student_outcome_predictor={}", config.logging.level).parse()?)
        .add_directive("tower_http=info".parse()?);
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    info!("Starting Student Outcome Predictor");

    let metrics = Arc::new(PredictionMetrics::new());
    let assets = Arc::new(AssetStore::new(config.assets.bundle_path.clone()));
    let templates = Arc::new(Templates::new().context("Failed to compile page templates")?);

    // Without the bundle no prediction is possible; every route reports why
    let router = match AppState::new(assets, metrics.clone(), templates.clone()) {
        Ok(state) => {
            info!(
                model = state.bundle().model.name(),
                expected_columns = state.bundle().expected_columns.len(),
                classes = ?state.bundle().class_labels,
                "Prediction pipeline ready"
            );

            if config.metrics.report_interval_secs > 0 {
                let reporter =
                    MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
                tokio::spawn(reporter.start());
            }

            create_router(state)
        }
        Err(e) => {
            error!(
                error = %e,
                kind = e.kind(),
                "Asset bundle unavailable, serving error page only"
            );
            create_unavailable_router(UnavailableState {
                templates,
                reason: e.to_string().into(),
            })
        }
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving prediction form on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Predictor shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
