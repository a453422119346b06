use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::constants::store::ROLLING_WINDOW;
use crate::data::record::SignalRecord;
use crate::data::store::{RecentOrder, SignalStore, Submission};
use crate::services::diagnostics::DiagnosticsTally;

pub struct AppState {
    pub store: SignalStore,
    pub diagnostics: DiagnosticsTally,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(get_stats))
        .route("/signals", get(get_signals))
        .route("/signals/latest", get(get_latest))
        .route("/signals/manual", post(submit_manual))
        .route("/diagnostics", get(get_diagnostics))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>, listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("API Server listening on {}", addr);
    }
    axum::serve(listener, router(state)).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.stats())
}

#[derive(Debug, Deserialize)]
struct SignalsParams {
    limit: Option<usize>,
    order: Option<String>,
}

async fn get_signals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SignalsParams>,
) -> impl IntoResponse {
    let order = match params.order.as_deref() {
        None | Some("newest") => RecentOrder::NewestFirst,
        Some("oldest") => RecentOrder::Chronological,
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("Unknown order '{}' (expected newest|oldest)", other),
            )
                .into_response()
        }
    };
    let limit = params.limit.unwrap_or(ROLLING_WINDOW);
    Json(state.store.recent(limit, order)).into_response()
}

async fn get_latest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.latest() {
        Some(signal) => Json(signal).into_response(),
        None => (StatusCode::NOT_FOUND, "No signals received yet").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ManualRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct ManualResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signal: Option<SignalRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

async fn submit_manual(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ManualRequest>,
) -> impl IntoResponse {
    let response = match state.store.submit_manual(&req.text) {
        Submission::Accepted(signal) => ManualResponse {
            status: "accepted",
            period_id: Some(signal.period_id().to_string()),
            signal: Some(signal),
            reason: None,
        },
        Submission::Duplicate(period_id) => ManualResponse {
            status: "duplicate",
            signal: None,
            period_id: Some(period_id),
            reason: None,
        },
        Submission::NotASignal(reason) => ManualResponse {
            status: "ignored",
            signal: None,
            period_id: None,
            reason: Some(reason.to_string()),
        },
    };
    Json(response)
}

async fn get_diagnostics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.diagnostics.counts())
}
