//! Health check endpoint for load balancers and monitoring.
//!
//! The store lives in process memory, so there is no dependency to probe;
//! the endpoint reports the live secret count alongside the status.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use vanish_core::SecretStore;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    live_secrets: usize,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        live_secrets: state.secrets.live_count().await,
    })
}
