use crate::{
    db::DbPool,
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub title: String,
    pub price: Decimal,
    /// 0 means "no sale"
    pub sale_price: Decimal,
    pub total_stock: i32,
}

/// Catalog writes the checkout core depends on. The storefront's admin CRUD
/// surface lives elsewhere; this is the seam it calls through.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.price < Decimal::ZERO || input.sale_price < Decimal::ZERO {
            return Err(ServiceError::Validation(
                "prices cannot be negative".to_string(),
            ));
        }
        if input.total_stock < 0 {
            return Err(ServiceError::Validation(
                "stock level cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            price: Set(input.price),
            sale_price: Set(input.sale_price),
            total_stock: Set(input.total_stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<product::Model>, ServiceError> {
        Ok(ProductEntity::find_by_id(product_id).one(&*self.db).await?)
    }
}
