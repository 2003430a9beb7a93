#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use storefront_api::{
    config::AppConfig,
    db,
    entities::{cart, product},
    events::{self, EventSender},
    handlers::AppServices,
    payments::{PaymentGateway, SandboxGateway},
    services::carts::NewCartItem,
    services::catalog::CreateProductInput,
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Test harness: the full application over an in-memory SQLite database and
/// a sandbox payment gateway.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Present when the app was built with the default approving sandbox
    pub sandbox: Option<Arc<SandboxGateway>>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// App backed by an approving sandbox gateway.
    pub async fn new() -> Self {
        let sandbox = Arc::new(SandboxGateway::approving());
        Self::build(sandbox.clone(), Some(sandbox)).await
    }

    /// App backed by an arbitrary gateway implementation.
    pub async fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::build(gateway, None).await
    }

    async fn build(
        gateway: Arc<dyn PaymentGateway>,
        sandbox: Option<Arc<SandboxGateway>>,
    ) -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18080, "test");
        // A single connection keeps the in-memory database alive and shared.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            gateway,
            cfg.settlement_currency.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            router: storefront_api::app_router(state.clone()),
            state,
            sandbox,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(
        &self,
        title: &str,
        price: Decimal,
        sale_price: Decimal,
        total_stock: i32,
    ) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                title: title.to_string(),
                price,
                sale_price,
                total_stock,
            })
            .await
            .expect("seed product for tests")
    }

    pub async fn seed_cart(&self, user_id: Uuid, items: &[(Uuid, i32)]) -> cart::Model {
        self.state
            .services
            .carts
            .create_cart(
                user_id,
                items
                    .iter()
                    .map(|(product_id, quantity)| NewCartItem {
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect(),
            )
            .await
            .expect("seed cart for tests")
    }

    pub async fn stock_level(&self, product_id: Uuid) -> i32 {
        self.state
            .services
            .inventory
            .stock_level(product_id)
            .await
            .expect("stock level for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
