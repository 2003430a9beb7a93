use crate::{
    db::DbPool,
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Outcome of a stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub new_stock: i32,
    /// Units actually absorbed; less than requested when the clamp engaged
    pub fulfilled: i32,
    /// True when the counter hit the zero floor before covering the request
    pub clamped: bool,
}

/// Inventory ledger: owns the per-product stock counters.
///
/// All writes go through a conditional update filtered on the observed
/// value, so concurrent callers against the same product row serialize on
/// the storage layer and the counter can never be driven negative.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Current stock level for a product.
    #[instrument(skip(self))]
    pub async fn stock_level(&self, product_id: Uuid) -> Result<i32, ServiceError> {
        let product = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(product.total_stock)
    }

    /// Catalog-management write. Goes through the same product row as the
    /// decrements, so it serializes against in-flight captures.
    #[instrument(skip(self))]
    pub async fn set_stock(&self, product_id: Uuid, quantity: i32) -> Result<(), ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::Validation(
                "stock level cannot be negative".to_string(),
            ));
        }

        let result = ProductEntity::update_many()
            .col_expr(product::Column::TotalStock, Expr::value(quantity))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }
        Ok(())
    }

    /// Atomically decrements a product's stock, clamped at zero.
    #[instrument(skip(self))]
    pub async fn decrement(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<StockDecrement, ServiceError> {
        let outcome = Self::decrement_on(&*self.db, product_id, quantity).await?;
        if outcome.clamped {
            warn!(
                product_id = %product_id,
                requested = quantity,
                fulfilled = outcome.fulfilled,
                "stock clamped at zero"
            );
        }
        Ok(outcome)
    }

    /// Decrement against an explicit connection, so the capture transaction
    /// can reuse the same read-compare-update cycle.
    ///
    /// The update is filtered on the stock value that was read; losing the
    /// race to a concurrent writer affects zero rows and the cycle re-reads.
    pub async fn decrement_on<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<StockDecrement, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation(
                "decrement quantity must be positive".to_string(),
            ));
        }

        loop {
            let product = ProductEntity::find_by_id(product_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?;

            let current = product.total_stock;
            let new_stock = (current - quantity).max(0);

            let result = ProductEntity::update_many()
                .col_expr(product::Column::TotalStock, Expr::value(new_stock))
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(product_id))
                .filter(product::Column::TotalStock.eq(current))
                .exec(conn)
                .await?;

            if result.rows_affected == 1 {
                return Ok(StockDecrement {
                    new_stock,
                    fulfilled: quantity.min(current),
                    clamped: current < quantity,
                });
            }
            // Another writer moved the counter between read and update.
        }
    }
}
