use crate::{
    db::DbPool,
    entities::cart::Entity as CartEntity,
    entities::cart_item,
    entities::order::{self, Entity as OrderEntity, OrderStatus, PaymentMethod, PaymentStatus},
    entities::order_item,
    entities::product::{self, Entity as ProductEntity},
    entities::stock_application,
    errors::ServiceError,
    events::{Event, EventSender},
    payments::{GatewayError, IntentRequest, LineItem, PaymentGateway},
    services::inventory::InventoryService,
    services::orders::{OrderResponse, OrderService},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Cart snapshot submitted by the client. Quantities are taken as-is after
/// validation; prices are re-read from the catalog and never trusted.
#[derive(Debug, Clone)]
pub struct InitiateCheckoutRequest {
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub items: Vec<CheckoutItem>,
    pub address_info: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CheckoutInitiated {
    pub order_id: Uuid,
    pub approval_url: String,
}

struct ResolvedLine {
    product_id: Uuid,
    title: String,
    quantity: i32,
    unit_price: Decimal,
}

/// Checkout orchestrator: prices the cart, registers the payment intent,
/// persists the pending order, and later applies the capture transaction
/// exactly once.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<OrderService>,
    event_sender: EventSender,
    settlement_currency: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<OrderService>,
        event_sender: EventSender,
        settlement_currency: String,
    ) -> Self {
        Self {
            db,
            gateway,
            orders,
            event_sender,
            settlement_currency,
        }
    }

    /// Prices the cart from the catalog, creates a payment intent, and
    /// persists a pending order.
    ///
    /// The gateway call completes before the first row is written: a
    /// rejection or timeout leaves nothing behind, and a retried initiate
    /// simply mints a fresh intent.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, cart_id = %request.cart_id))]
    pub async fn initiate(
        &self,
        request: InitiateCheckoutRequest,
    ) -> Result<CheckoutInitiated, ServiceError> {
        let lines = self.resolve_lines(&request.items).await?;
        let total = lines
            .iter()
            .fold(Decimal::ZERO, |sum, line| {
                sum + line.unit_price * Decimal::from(line.quantity)
            })
            .round_dp(2);

        let intent = self
            .gateway
            .create_intent(IntentRequest {
                items: lines
                    .iter()
                    .map(|line| LineItem {
                        title: line.title.clone(),
                        sku: line.product_id.to_string(),
                        unit_price: line.unit_price,
                        quantity: line.quantity,
                    })
                    .collect(),
                total,
                currency: self.settlement_currency.clone(),
                description: "Storefront purchase".to_string(),
            })
            .await
            .map_err(|err| match err {
                GatewayError::Rejected(detail) => {
                    error!(detail = %detail, "payment gateway rejected intent");
                    ServiceError::PaymentRejected(detail)
                }
                GatewayError::Unavailable(detail) => {
                    error!(detail = %detail, "payment gateway unreachable");
                    ServiceError::PaymentUnavailable(detail)
                }
            })?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let txn = self.db.begin().await?;
        order::ActiveModel {
            id: Set(order_id),
            user_id: Set(request.user_id),
            cart_id: Set(request.cart_id),
            order_status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            payment_method: Set(PaymentMethod::Paypal),
            total_amount: Set(total),
            currency: Set(self.settlement_currency.clone()),
            address_info: Set(request.address_info),
            intent_id: Set(intent.intent_id.clone()),
            payment_id: Set(None),
            payer_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for line in &lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                title: Set(line.title.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(order_id = %order_id, total = %total, "checkout initiated");

        self.emit(Event::OrderCreated(order_id)).await;
        self.emit(Event::PaymentIntentCreated {
            order_id,
            intent_id: intent.intent_id,
        })
        .await;

        Ok(CheckoutInitiated {
            order_id,
            approval_url: intent.approval_url,
        })
    }

    /// Finalizes a paid order: confirms it, applies the stock decrements,
    /// and destroys the source cart, exactly once, no matter how many
    /// capture callbacks arrive.
    #[instrument(skip(self, payment_id, payer_id), fields(order_id = %order_id))]
    pub async fn capture(
        &self,
        order_id: Uuid,
        payment_id: String,
        payer_id: String,
    ) -> Result<OrderResponse, ServiceError> {
        let existing = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if existing.order_status.is_terminal() {
            return self.replayed(order_id).await;
        }

        let mut items = OrderEntity::find_by_id(order_id)
            .find_with_related(order_item::Entity)
            .all(&*self.db)
            .await?
            .pop()
            .map(|(_, items)| items)
            .unwrap_or_default();
        // Touch product rows in a stable order across concurrent captures.
        items.sort_by_key(|item| item.product_id);

        let now = Utc::now();
        let txn = self.db.begin().await?;

        // The pending -> confirmed flip is conditional on still being
        // pending; its affected-row count decides which concurrent caller
        // applies the side effects. Everyone else observes the post-state.
        let claimed = OrderEntity::update_many()
            .col_expr(
                order::Column::OrderStatus,
                Expr::value(OrderStatus::Confirmed),
            )
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid),
            )
            .col_expr(order::Column::PaymentId, Expr::value(Some(payment_id.clone())))
            .col_expr(order::Column::PayerId, Expr::value(Some(payer_id)))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::OrderStatus.eq(OrderStatus::Pending))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return self.replayed(order_id).await;
        }

        for item in &items {
            // The marker insert is what makes a re-run past a partial
            // failure a no-op: only a fresh row earns a decrement.
            let fresh = stock_application::Entity::insert(stock_application::ActiveModel {
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                applied_at: Set(now),
            })
            .on_conflict(
                OnConflict::columns([
                    stock_application::Column::OrderId,
                    stock_application::Column::ProductId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

            if fresh == 0 {
                continue;
            }

            let decrement =
                InventoryService::decrement_on(&txn, item.product_id, item.quantity).await?;
            if decrement.clamped {
                warn!(
                    product_id = %item.product_id,
                    requested = item.quantity,
                    fulfilled = decrement.fulfilled,
                    "stock clamped at zero during capture"
                );
                self.emit(Event::OversellDetected {
                    order_id,
                    product_id: item.product_id,
                    requested: item.quantity,
                    fulfilled: decrement.fulfilled,
                })
                .await;
            }
        }

        // Cart cleanup is part of the same unit; deleting an already-absent
        // cart affects zero rows and is not an error.
        let cart_id = existing.cart_id;
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await?;
        CartEntity::delete_by_id(cart_id).exec(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, "order captured");
        self.emit(Event::OrderConfirmed {
            order_id,
            payment_id,
        })
        .await;
        self.emit(Event::CartPurged(cart_id)).await;

        self.orders.get_order(order_id).await
    }

    /// Duplicate/late capture: report the settled order unchanged.
    async fn replayed(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        info!(order_id = %order_id, "capture replayed for settled order");
        self.emit(Event::OrderCaptureReplayed(order_id)).await;
        self.orders.get_order(order_id).await
    }

    /// Validates the submitted lines and prices them from a single batched
    /// catalog read, so every line of one request sees the same prices.
    async fn resolve_lines(
        &self,
        items: &[CheckoutItem],
    ) -> Result<Vec<ResolvedLine>, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::Validation("cart has no items".to_string()));
        }
        for item in items {
            if item.quantity <= 0 {
                return Err(ServiceError::Validation(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
        }

        let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<Uuid, product::Model> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        items
            .iter()
            .map(|item| {
                let product = products.get(&item.product_id).ok_or_else(|| {
                    ServiceError::Validation(format!("unknown product {}", item.product_id))
                })?;
                Ok(ResolvedLine {
                    product_id: product.id,
                    title: product.title.clone(),
                    quantity: item.quantity,
                    unit_price: product.effective_price(),
                })
            })
            .collect()
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "failed to publish event");
        }
    }
}
