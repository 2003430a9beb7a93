use crate::{
    db::DbPool,
    entities::cart::{self, Entity as CartEntity},
    entities::cart_item,
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// A line to place in a new cart.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart store. Creation and lookup live here; destruction on fulfillment is
/// part of the capture transaction owned by the checkout orchestrator.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
}

impl CartService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, items), fields(user_id = %user_id))]
    pub async fn create_cart(
        &self,
        user_id: Uuid,
        items: Vec<NewCartItem>,
    ) -> Result<cart::Model, ServiceError> {
        let now = Utc::now();
        let cart_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        let cart = cart::ActiveModel {
            id: Set(cart_id),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for item in items {
            cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn find_cart(&self, cart_id: Uuid) -> Result<Option<cart::Model>, ServiceError> {
        Ok(CartEntity::find_by_id(cart_id).one(&*self.db).await?)
    }
}
