//! `GET /clock`

use axum::extract::State;
use axum::Json;
use coinclock_core::SimDate;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClockResponse {
    pub now: SimDate,
    pub epoch_millis: i64,
    pub day_duration_secs: u64,
    /// Snapshots published since startup.
    pub generation: u64,
}

pub async fn clock(State(state): State<AppState>) -> Json<ClockResponse> {
    let now = state.clock.now();
    Json(ClockResponse {
        now,
        epoch_millis: now.unix_millis(),
        day_duration_secs: state.clock.day_duration().as_secs(),
        generation: state.catalog.generation(),
    })
}
