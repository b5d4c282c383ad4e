// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are public: the dashboard is a
// read-only analysis tool with no account state to protect.
//
// CORS is configured permissively so the browser front end can be served from
// any origin.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{run_analysis, run_summary, AnalysisRequest, SummaryRequest};
use crate::app_state::AppState;
use crate::errors::EngineError;
use crate::types::AnalysisType;

type ApiError = (StatusCode, Json<serde_json::Value>);

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/tickers", get(tickers))
        .route("/api/v1/analysis-types", get(analysis_types))
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/summary", post(summary))
        .layer(cors)
        .with_state(state)
}

/// Map an engine error onto an HTTP status and `{ "error": ... }` body.
fn error_response(state: &AppState, err: EngineError) -> ApiError {
    let status = match err {
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::UpstreamUnavailable { .. } | EngineError::UpstreamRejected { .. } => {
            StatusCode::BAD_GATEWAY
        }
    };
    let message = match &err {
        EngineError::InvalidInput(msg) => msg.clone(),
        other => other.to_string(),
    };
    warn!(status = %status, error = %err, "request rejected");
    state.push_error(message.clone());
    (status, Json(json!({ "error": message })))
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health())
}

// =============================================================================
// Selectors
// =============================================================================

async fn tickers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config();
    Json(json!({
        "tickers": config.tickers,
        "default_start_date": config.default_start_date,
    }))
}

#[derive(Serialize)]
struct AnalysisTypeInfo {
    id: AnalysisType,
    label: &'static str,
}

async fn analysis_types() -> impl IntoResponse {
    let types: Vec<AnalysisTypeInfo> = AnalysisType::ALL
        .iter()
        .map(|t| AnalysisTypeInfo {
            id: *t,
            label: t.label(),
        })
        .collect();
    Json(types)
}

// =============================================================================
// Analysis
// =============================================================================

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = run_analysis(state.provider.as_ref(), state.config(), &req)
        .await
        .map_err(|e| error_response(&state, e))?;

    let served = state.record_request();
    info!(
        request_id = %report.request_id,
        panels = report.panels.len(),
        served,
        "analysis served"
    );
    Ok(Json(report))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let panels = run_summary(state.provider.as_ref(), state.config(), &req)
        .await
        .map_err(|e| error_response(&state, e))?;

    state.record_request();
    Ok(Json(panels))
}
