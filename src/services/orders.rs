use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity, OrderStatus, PaymentMethod, PaymentStatus},
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Order as exposed over the API, with its embedded item snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub items: Vec<OrderItemResponse>,
    #[schema(value_type = String, example = "35.50")]
    pub total_amount: Decimal,
    pub currency: String,
    #[schema(value_type = Object)]
    pub address_info: serde_json::Value,
    #[schema(value_type = String, example = "paypal")]
    pub payment_method: PaymentMethod,
    #[schema(value_type = String, example = "confirmed")]
    pub order_status: OrderStatus,
    #[schema(value_type = String, example = "paid")]
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub payer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "10.00")]
    pub unit_price: Decimal,
}

/// Read side of the order record: simple lookups, no locking.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Retrieves a single order with its item snapshot.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(Self::to_response(order, items))
    }

    /// All orders belonging to a customer, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        // One batched read for every order's items instead of a query per order.
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(&*self.db)
            .await?;
        for item in items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                Self::to_response(order, items)
            })
            .collect())
    }

    pub(crate) fn to_response(
        order: order::Model,
        items: Vec<order_item::Model>,
    ) -> OrderResponse {
        OrderResponse {
            id: order.id,
            user_id: order.user_id,
            cart_id: order.cart_id,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    title: item.title,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            total_amount: order.total_amount,
            currency: order.currency,
            address_info: order.address_info,
            payment_method: order.payment_method,
            order_status: order.order_status,
            payment_status: order.payment_status,
            payment_id: order.payment_id,
            payer_id: order.payer_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn to_response_carries_snapshot_and_statuses() {
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();

        let order = order::Model {
            id: order_id,
            user_id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            order_status: OrderStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            payment_method: PaymentMethod::Paypal,
            total_amount: dec!(35.50),
            currency: "USD".to_string(),
            address_info: json!({"city": "Springfield"}),
            intent_id: "PAY-1".to_string(),
            payment_id: Some("PAYID-1".to_string()),
            payer_id: Some("PAYER-1".to_string()),
            created_at: now,
            updated_at: now,
        };
        let items = vec![order_item::Model {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            title: "Widget".to_string(),
            quantity: 2,
            unit_price: dec!(10.00),
            created_at: now,
        }];

        let response = OrderService::to_response(order, items);
        assert_eq!(response.id, order_id);
        assert_eq!(response.order_status, OrderStatus::Confirmed);
        assert_eq!(response.payment_status, PaymentStatus::Paid);
        assert_eq!(response.total_amount, dec!(35.50));
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].product_id, product_id);
        assert_eq!(response.items[0].unit_price, dec!(10.00));
    }
}
