//! `GET /health`

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Coins in the current snapshot.
    pub coins: usize,
}

/// Liveness check; 200 whenever the server is up, even with an empty catalog.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        coins: state.catalog.len(),
    })
}
