//! Secret storage and retrieval endpoints.
//!
//! The flow mirrors one-time secret sharing: POST a payload, hand the
//! returned URL to someone, and the first GET on it redeems the secret and
//! destroys it. Expired and already-redeemed keys are indistinguishable
//! from keys that never existed.
//!
//! ## Endpoints
//!
//! - POST /store - store a payload, returns the key and a retrieval URL
//! - GET /secret/{key} - redeem a key, returns the payload exactly once
//!
//! The retrieval URL is `{base}/secret/{key}` where the base is the
//! configured public base URL, falling back to the request's Host header.

use std::time::Duration;

use axum::{
    Json, Router, debug_handler,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use vanish_core::{Key, SecretStore};

use crate::{error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/store", post(store_secret))
        .route("/secret/{key}", get(retrieve_secret))
}

#[derive(Debug, Deserialize)]
struct StoreQuery {
    /// Optional time limit in seconds. Omitted means the configured default
    /// (if any) applies and the secret otherwise lives until redeemed.
    ttl: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreResponse {
    key: String,
    url: String,
}

/// Base for retrieval URLs: configured value, else the request's Host
/// header (same fallback the service has always had behind a proxy).
fn public_base(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

#[debug_handler]
async fn store_secret(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    let ttl = match query.ttl {
        Some(0) => {
            return Err(AppError::Validation("ttl must be at least 1 second".into()));
        }
        other => other.map(Duration::from_secs),
    };

    let key = state.secrets.put(body.to_vec(), ttl).await?;

    // The key is the retrieval capability; only its prefix goes to logs.
    tracing::info!(key_prefix = key.prefix(), ttl_secs = ?query.ttl, "secret stored");

    let url = format!("{}/secret/{}", public_base(&state, &headers), key);
    Ok((
        StatusCode::CREATED,
        Json(StoreResponse {
            key: key.to_string(),
            url,
        }),
    ))
}

#[debug_handler]
async fn retrieve_secret(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    let key = Key::from(key);
    let payload = state.secrets.take_once(&key).await?;

    // The secret is already gone from the store at this point. If the caller
    // aborts before reading the response the payload is lost; that is the
    // deliberate no-recovery policy of exactly-once retrieval.
    tracing::info!(key_prefix = key.prefix(), bytes = payload.len(), "secret redeemed");

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        payload,
    ))
}
