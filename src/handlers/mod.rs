use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    payments::PaymentGateway,
    services::{
        carts::CartService, catalog::CatalogService, checkout::CheckoutService,
        inventory::InventoryService, orders::OrderService,
    },
};

pub mod checkout;
pub mod common;
pub mod health;
pub mod orders;

/// Aggregate of the services HTTP handlers reach through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub checkout: Arc<CheckoutService>,
    pub inventory: Arc<InventoryService>,
    pub orders: Arc<OrderService>,
    pub carts: Arc<CartService>,
    pub catalog: Arc<CatalogService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
        settlement_currency: String,
    ) -> Self {
        let orders = Arc::new(OrderService::new(db.clone()));
        Self {
            checkout: Arc::new(CheckoutService::new(
                db.clone(),
                gateway,
                orders.clone(),
                event_sender,
                settlement_currency,
            )),
            inventory: Arc::new(InventoryService::new(db.clone())),
            orders,
            carts: Arc::new(CartService::new(db.clone())),
            catalog: Arc::new(CatalogService::new(db)),
        }
    }
}
