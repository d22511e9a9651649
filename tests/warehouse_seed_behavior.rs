//! Behavior-driven tests for seeding the catalog from the coin store
//!
//! The store only supplies the initial snapshot; the first successful tick
//! replaces it wholesale.

use std::sync::Arc;

use coinclock_core::repository::to_records;
use coinclock_core::{CoinRepository, RepositoryError};
use coinclock_tests::{
    coin, coin_id, coins_body, daemon_with, jan, shutdown, CoinCatalog, RetryPolicy,
    ScriptedHttpClient,
};
use coinclock_warehouse::{CoinRecord, Warehouse, WarehouseConfig};
use serde_json::json;
use tempfile::{tempdir, TempDir};

fn seeded_warehouse(ids: &[(&str, f64)]) -> (TempDir, Warehouse) {
    let dir = tempdir().expect("tempdir");
    let warehouse =
        Warehouse::open(WarehouseConfig::at(dir.path().join("coins.duckdb"))).expect("open");
    let coins: Vec<_> = ids.iter().map(|(id, price)| coin(id, *price)).collect();
    warehouse
        .seed_coins(&to_records(&coins).expect("encode seed"))
        .expect("seed");
    (dir, warehouse)
}

// =============================================================================
// Coin Store: Initial Load
// =============================================================================

#[test]
fn when_the_store_holds_coins_then_the_initial_snapshot_has_them_in_order() {
    // Given: A store seeded with btc then eth
    let (_dir, warehouse) = seeded_warehouse(&[("btc", 800.0), ("eth", 12.5)]);

    // When: The repository loads its initial snapshot
    let snapshot = warehouse.load_initial().expect("load");

    // Then: Both coins are present, in stored order, with no publication date
    let ids: Vec<_> = snapshot.coins.iter().map(|coin| coin.id.as_str()).collect();
    assert_eq!(ids, vec!["btc", "eth"]);
    assert_eq!(snapshot.as_of, None);
    assert_eq!(
        snapshot.coins[0].attribute("current_price"),
        Some(&json!(800.0))
    );
}

#[test]
fn when_the_store_is_empty_then_the_initial_snapshot_is_empty() {
    // Given: A freshly created store
    let dir = tempdir().expect("tempdir");
    let warehouse =
        Warehouse::open(WarehouseConfig::at(dir.path().join("coins.duckdb"))).expect("open");

    // When/Then: Loading yields an empty snapshot rather than an error
    assert!(warehouse.load_initial().expect("load").is_empty());
}

#[test]
fn when_a_stored_payload_disagrees_with_its_id_then_loading_fails_with_its_position() {
    // Given: A store whose second row claims id "eth" but carries a btc payload
    let dir = tempdir().expect("tempdir");
    let warehouse =
        Warehouse::open(WarehouseConfig::at(dir.path().join("coins.duckdb"))).expect("open");
    warehouse
        .seed_coins(&[
            CoinRecord::from_json(&json!({ "id": "btc" })).expect("record"),
            CoinRecord::new("eth", json!({ "id": "btc" }).to_string()),
        ])
        .expect("rows are well-formed JSON objects");

    // When: The repository loads
    let error = warehouse.load_initial().expect_err("mismatched row");

    // Then: The error names the offending row
    assert!(matches!(error, RepositoryError::Decode { position: 1, .. }));
}

// =============================================================================
// Coin Store + Daemon: Seed Then Replace
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_the_catalog_is_seeded_then_lookups_work_before_the_first_tick() {
    // Given: A catalog built from the store
    let (_dir, warehouse) = seeded_warehouse(&[("btc", 800.0)]);
    let catalog = Arc::new(CoinCatalog::new(warehouse.load_initial().expect("load")));

    // Then: The seed is served at generation zero
    assert_eq!(catalog.generation(), 0);
    assert_eq!(catalog.lookup(&coin_id("btc")), Ok(coin("btc", 800.0)));
}

#[tokio::test(start_paused = true)]
async fn when_the_first_tick_succeeds_then_the_seed_is_replaced_entirely() {
    // Given: A catalog seeded with btc and an upstream that only knows eth
    let (_dir, warehouse) = seeded_warehouse(&[("btc", 800.0)]);
    let catalog = Arc::new(CoinCatalog::new(warehouse.load_initial().expect("load")));
    let client = ScriptedHttpClient::serving(coins_body(&["eth"]));
    let mut daemon = daemon_with(client, RetryPolicy::default(), Arc::clone(&catalog));
    let (_trigger, mut listener) = shutdown::channel();

    // When: One tick runs
    daemon.tick(&mut listener).await.expect("tick succeeds");

    // Then: The seed is gone, not merged
    assert!(catalog.lookup(&coin_id("btc")).is_err());
    assert!(catalog.lookup(&coin_id("eth")).is_ok());
    assert_eq!(catalog.snapshot().as_of, Some(jan(1)));

    // And: The store itself is untouched by publication
    assert_eq!(warehouse.coin_count().expect("count"), 1);
}

#[test]
fn when_the_repository_closes_then_the_seed_survives_a_reopen() {
    // Given: A seeded store that is checkpointed on close
    let (dir, warehouse) = seeded_warehouse(&[("btc", 800.0), ("eth", 12.5)]);
    warehouse.close().expect("close");
    drop(warehouse);

    // When: The same file is opened again
    let reopened =
        Warehouse::open(WarehouseConfig::at(dir.path().join("coins.duckdb"))).expect("reopen");

    // Then: The seed is intact
    assert_eq!(reopened.load_initial().expect("load").len(), 2);
}
