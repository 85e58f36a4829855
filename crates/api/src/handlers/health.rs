//! Liveness endpoints for load balancers and the dashboard.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use chrono::Utc;
use shared::api::{HealthResponse, PingResponse};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ping", get(ping))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        storage_dir: state.config.storage_dir.clone(),
    })
}

async fn ping() -> impl IntoResponse {
    Json(PingResponse {
        ok: true,
        ts: Utc::now().timestamp_millis(),
    })
}
