//! Axum application builder.

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{clock, coins, health};
use crate::state::AppState;

/// Create the router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health::health))
        .route("/clock", get(clock::clock))
        .route("/coins", get(coins::list_coins))
        .route("/coins/:id", get(coins::get_coin))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use coinclock_core::{CatalogSnapshot, Coin, CoinCatalog, CoinId, SimDate, VirtualClock};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn fixture() -> (Router, Arc<CoinCatalog>, VirtualClock) {
        let btc = Coin::new(CoinId::parse("btc").expect("valid id"))
            .with_attribute("current_price", json!(812.4));
        let eth = Coin::new(CoinId::parse("eth").expect("valid id"));
        let catalog = Arc::new(CoinCatalog::new(CatalogSnapshot::new(None, vec![btc, eth])));
        let clock = VirtualClock::new(
            SimDate::from_ymd(2014, 1, 1).expect("valid"),
            Duration::from_secs(60),
        );
        let app = create_app(AppState::new(Arc::clone(&catalog), clock.reader()));
        (app, catalog, clock)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn known_coin_returns_its_full_payload() {
        let (app, _, _) = fixture();

        let (status, body) = get(app, "/coins/btc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": "btc", "current_price": 812.4 }));
    }

    #[tokio::test]
    async fn unknown_coin_is_404_with_error_body() {
        let (app, _, _) = fixture();

        let (status, body) = get(app, "/coins/ltc").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "coin 'ltc' not found", "status": 404 }));
    }

    #[tokio::test]
    async fn blank_id_is_400() {
        let (app, _, _) = fixture();

        let (status, body) = get(app, "/coins/%20%20").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], json!(400));
    }

    #[tokio::test]
    async fn ids_with_spaces_and_symbols_are_looked_up_verbatim() {
        let (app, catalog, _) = fixture();
        catalog.replace(CatalogSnapshot::new(
            None,
            vec![
                Coin::new(CoinId::parse("binance peg").expect("valid id")),
                Coin::new(CoinId::parse("b$c").expect("valid id")),
            ],
        ));

        let (status, body) = get(app.clone(), "/coins/binance%20peg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": "binance peg" }));

        let (status, _) = get(app, "/coins/b%24c").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn list_reflects_the_latest_replace() {
        let (app, catalog, _) = fixture();
        let day = SimDate::from_ymd(2014, 1, 1).expect("valid");
        catalog.replace(CatalogSnapshot::new(
            Some(day),
            vec![Coin::new(CoinId::parse("doge").expect("valid id"))],
        ));

        let (status, body) = get(app, "/coins").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["as_of"], json!("2014-01-01T00:00:00Z"));
        assert_eq!(body["coins"], json!([{ "id": "doge" }]));
    }

    #[tokio::test]
    async fn clock_reports_simulated_date_and_generation() {
        let (app, catalog, mut clock) = fixture();
        catalog.replace(CatalogSnapshot::empty());
        clock.advance().expect("in range");

        let (status, body) = get(app, "/clock").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "now": "2014-01-02T00:00:00Z",
                "epoch_millis": 1_388_620_800_000_i64,
                "day_duration_secs": 60,
                "generation": 1
            })
        );
    }

    #[tokio::test]
    async fn health_counts_current_coins() {
        let (app, _, _) = fixture();

        let (status, body) = get(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "coins": 2 }));
    }
}
