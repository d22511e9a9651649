//! Coin endpoints.
//!
//! - `GET /coins/:id` - one coin from the current snapshot
//! - `GET /coins` - the whole current snapshot

use axum::extract::{Path, State};
use axum::Json;
use coinclock_core::{CatalogSnapshot, Coin, CoinId};

use crate::error::AppResult;
use crate::state::AppState;

/// `GET /coins/:id`
///
/// 400 for a blank id, 404 if the current snapshot has no such coin.
pub async fn get_coin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Coin>> {
    let id = CoinId::parse(&id)?;
    let coin = state.catalog.lookup(&id)?;
    Ok(Json(coin))
}

/// `GET /coins`
pub async fn list_coins(State(state): State<AppState>) -> Json<CatalogSnapshot> {
    let snapshot = state.catalog.snapshot();
    Json(CatalogSnapshot::clone(&snapshot))
}
