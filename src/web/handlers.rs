//! Request handlers for the form pages, the JSON API and system endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Form, Json,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::error;

use crate::form::{GuideRow, StudentForm, FEATURE_GUIDE};
use crate::metrics::MetricsSnapshot;
use crate::types::feature::FeatureValue;
use crate::types::prediction::PredictionResult;
use crate::web::state::{AppState, UnavailableState};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub expected_columns: usize,
    pub class_labels: Vec<String>,
    pub bundle_path: String,
}

/// Wrap a rendered page, turning template failures into a 500
fn page(rendered: Result<String, minijinja::Error>) -> Result<Html<String>, StatusCode> {
    rendered.map(Html).map_err(|e| {
        error!(error = %e, "Failed to render page");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let form = StudentForm::initial(state.bundle());
    page(state.templates.form_page(&form, None))
}

/// POST /predict
pub async fn predict_form(
    State(state): State<AppState>,
    Form(form): Form<StudentForm>,
) -> Result<(StatusCode, Html<String>), StatusCode> {
    let form = form.clamped();
    match state.predictor.predict(&form.to_user_values()) {
        Ok(result) => {
            let html = page(state.templates.form_page(&form, Some(Ok(&result))))?;
            Ok((StatusCode::OK, html))
        }
        Err(e) => {
            let html = page(
                state
                    .templates
                    .form_page(&form, Some(Err(&e.to_string()))),
            )?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, html))
        }
    }
}

/// GET /guide
pub async fn guide(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    page(state.templates.guide_page())
}

/// POST /api/predict
pub async fn predict_json(
    State(state): State<AppState>,
    Json(user_values): Json<HashMap<String, FeatureValue>>,
) -> std::result::Result<Json<PredictionResult>, (StatusCode, Json<ErrorBody>)> {
    state.predictor.predict(&user_values).map(Json).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                error: e.to_string(),
                kind: e.kind(),
            }),
        )
    })
}

/// GET /api/guide
pub async fn guide_json() -> Json<&'static [GuideRow]> {
    Json(&FEATURE_GUIDE[..])
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let bundle = state.bundle();
    Json(HealthResponse {
        status: "ok",
        model: bundle.model.name().to_string(),
        expected_columns: bundle.expected_columns.len(),
        class_labels: bundle.class_labels.clone(),
        bundle_path: state.assets.path().display().to_string(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Any request while the asset bundle is unavailable
pub async fn unavailable(State(state): State<UnavailableState>) -> (StatusCode, Html<String>) {
    let body = state
        .templates
        .unavailable_page(&state.reason)
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to render unavailable page");
            state.reason.to_string()
        });
    (StatusCode::SERVICE_UNAVAILABLE, Html(body))
}
