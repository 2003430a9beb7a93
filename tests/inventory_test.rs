//! Integration tests for the inventory ledger: clamped decrements under
//! concurrency and the catalog-side stock writes.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn decrement_reduces_stock_and_reports_no_clamp() {
    let app = TestApp::new().await;
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 5).await;

    let outcome = app
        .state
        .services
        .inventory
        .decrement(widget.id, 3)
        .await
        .unwrap();

    assert_eq!(outcome.new_stock, 2);
    assert_eq!(outcome.fulfilled, 3);
    assert!(!outcome.clamped);
    assert_eq!(app.stock_level(widget.id).await, 2);
}

#[tokio::test]
async fn decrement_beyond_stock_clamps_at_zero() {
    let app = TestApp::new().await;
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 2).await;

    let outcome = app
        .state
        .services
        .inventory
        .decrement(widget.id, 5)
        .await
        .unwrap();

    assert_eq!(outcome.new_stock, 0);
    assert_eq!(outcome.fulfilled, 2);
    assert!(outcome.clamped);
    assert_eq!(app.stock_level(widget.id).await, 0);
}

#[tokio::test]
async fn exact_drain_is_not_an_oversell() {
    let app = TestApp::new().await;
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 4).await;

    let outcome = app
        .state
        .services
        .inventory
        .decrement(widget.id, 4)
        .await
        .unwrap();

    assert_eq!(outcome.new_stock, 0);
    assert!(!outcome.clamped);
}

#[tokio::test]
async fn concurrent_decrements_never_drive_stock_negative() {
    let app = TestApp::new().await;
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 10).await;

    // 20 concurrent single-unit decrements against 10 units of stock.
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let inventory = app.state.services.inventory.clone();
        let product_id = widget.id;
        tasks.push(tokio::spawn(async move {
            inventory.decrement(product_id, 1).await
        }));
    }

    let mut fulfilled = 0;
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.new_stock >= 0);
        fulfilled += outcome.fulfilled;
    }

    // Exactly the available units were handed out, and the floor held.
    assert_eq!(fulfilled, 10);
    assert_eq!(app.stock_level(widget.id).await, 0);
}

#[tokio::test]
async fn set_stock_replenishes_and_validates() {
    let app = TestApp::new().await;
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 0).await;

    app.state
        .services
        .inventory
        .set_stock(widget.id, 7)
        .await
        .unwrap();
    assert_eq!(app.stock_level(widget.id).await, 7);

    assert!(app
        .state
        .services
        .inventory
        .set_stock(widget.id, -1)
        .await
        .is_err());
    assert!(app
        .state
        .services
        .inventory
        .set_stock(Uuid::new_v4(), 3)
        .await
        .is_err());
}

#[tokio::test]
async fn unknown_product_lookups_fail() {
    let app = TestApp::new().await;
    assert!(app
        .state
        .services
        .inventory
        .stock_level(Uuid::new_v4())
        .await
        .is_err());
    assert!(app
        .state
        .services
        .inventory
        .decrement(Uuid::new_v4(), 1)
        .await
        .is_err());
}
