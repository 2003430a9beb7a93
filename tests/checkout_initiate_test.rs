//! Integration tests for checkout initiation: authoritative pricing, input
//! validation, and the no-persistence guarantee on gateway failure.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use storefront_api::payments::SandboxGateway;
use uuid::Uuid;

fn address() -> serde_json::Value {
    json!({
        "street": "12 Main St",
        "city": "Springfield",
        "postal_code": "62704",
        "country": "US"
    })
}

#[tokio::test]
async fn total_is_computed_from_catalog_prices() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();

    // One product at list price, one on sale.
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 50).await;
    let gadget = app.seed_product("Gadget", dec!(20.00), dec!(15.50), 50).await;
    let cart = app
        .seed_cart(user_id, &[(widget.id, 2), (gadget.id, 1)])
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": user_id,
                "cart_id": cart.id,
                "cart_items": [
                    { "product_id": widget.id, "quantity": 2 },
                    { "product_id": gadget.id, "quantity": 1 }
                ],
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["approval_url"].as_str().unwrap().starts_with("https://"));
    let order_id: Uuid = serde_json::from_value(body["order_id"].clone()).unwrap();

    // 2 * 10.00 + 15.50, independent of anything the client could submit.
    let order = app
        .state
        .services
        .orders
        .get_order(order_id)
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec!(35.50));
    assert_eq!(order.currency, "USD");
    assert_eq!(order.items.len(), 2);
    let sale_line = order
        .items
        .iter()
        .find(|item| item.product_id == gadget.id)
        .unwrap();
    assert_eq!(sale_line.unit_price, dec!(15.50));
}

#[tokio::test]
async fn client_supplied_prices_are_ignored() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 50).await;
    let cart = app.seed_cart(user_id, &[(widget.id, 1)]).await;

    // Price and total fields in the payload are simply not part of the
    // contract; the order must still be priced from the catalog.
    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": user_id,
                "cart_id": cart.id,
                "cart_items": [
                    { "product_id": widget.id, "quantity": 1, "price": "0.01" }
                ],
                "total_amount": "0.01",
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let order_id: Uuid = serde_json::from_value(body["order_id"].clone()).unwrap();
    let order = app
        .state
        .services
        .orders
        .get_order(order_id)
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec!(10.00));
}

#[tokio::test]
async fn total_rounds_to_minor_unit_precision() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    let odd = app.seed_product("Odd", dec!(3.333), dec!(0), 50).await;
    let cart = app.seed_cart(user_id, &[(odd.id, 3)]).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": user_id,
                "cart_id": cart.id,
                "cart_items": [ { "product_id": odd.id, "quantity": 3 } ],
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let order_id: Uuid = serde_json::from_value(body["order_id"].clone()).unwrap();
    let order = app
        .state
        .services
        .orders
        .get_order(order_id)
        .await
        .unwrap();
    // 3 * 3.333 = 9.999 -> 10.00 at two decimal places
    let total: Decimal = order.total_amount;
    assert_eq!(total, dec!(10.00));
}

#[tokio::test]
async fn empty_cart_is_rejected_before_any_gateway_call() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": Uuid::new_v4(),
                "cart_id": Uuid::new_v4(),
                "cart_items": [],
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.sandbox.as_ref().unwrap().issued(), 0);
}

#[tokio::test]
async fn non_positive_quantity_is_rejected() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 50).await;
    let cart = app.seed_cart(user_id, &[(widget.id, 1)]).await;

    for quantity in [0, -3] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/checkout/initiate",
                Some(json!({
                    "user_id": user_id,
                    "cart_id": cart.id,
                    "cart_items": [ { "product_id": widget.id, "quantity": quantity } ],
                    "address_info": address()
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(app.sandbox.as_ref().unwrap().issued(), 0);
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": Uuid::new_v4(),
                "cart_id": Uuid::new_v4(),
                "cart_items": [ { "product_id": Uuid::new_v4(), "quantity": 1 } ],
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gateway_rejection_persists_no_order() {
    let app = TestApp::with_gateway(Arc::new(SandboxGateway::rejecting())).await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 50).await;
    let cart = app.seed_cart(user_id, &[(widget.id, 1)]).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": user_id,
                "cart_id": cart.id,
                "cart_items": [ { "product_id": widget.id, "quantity": 1 } ],
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    // Provider detail must not leak to the client.
    assert!(!body["message"].as_str().unwrap().contains("sandbox"));

    let orders = app
        .state
        .services
        .orders
        .list_orders_for_user(user_id)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn gateway_outage_persists_no_order() {
    let app = TestApp::with_gateway(Arc::new(SandboxGateway::unavailable())).await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 50).await;
    let cart = app.seed_cart(user_id, &[(widget.id, 1)]).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout/initiate",
            Some(json!({
                "user_id": user_id,
                "cart_id": cart.id,
                "cart_items": [ { "product_id": widget.id, "quantity": 1 } ],
                "address_info": address()
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let orders = app
        .state
        .services
        .orders
        .list_orders_for_user(user_id)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn each_initiate_mints_exactly_one_intent() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(10.00), dec!(0), 50).await;
    let cart = app.seed_cart(user_id, &[(widget.id, 1)]).await;

    let payload = json!({
        "user_id": user_id,
        "cart_id": cart.id,
        "cart_items": [ { "product_id": widget.id, "quantity": 1 } ],
        "address_info": address()
    });

    let first = app
        .request(Method::POST, "/api/v1/checkout/initiate", Some(payload.clone()))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(app.sandbox.as_ref().unwrap().issued(), 1);

    // A client retry of initiate is a fresh attempt: it mints a fresh
    // intent and a fresh pending order; stale intents are abandoned.
    let second = app
        .request(Method::POST, "/api/v1/checkout/initiate", Some(payload))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(app.sandbox.as_ref().unwrap().issued(), 2);
}
