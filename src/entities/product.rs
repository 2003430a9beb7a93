use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product catalog entity, reduced to the slice checkout needs: pricing and
/// the stock counter. `total_stock` is only ever written through a
/// conditional update against an observed value, never a blind save.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    /// 0 means "no sale"
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub sale_price: Decimal,
    pub total_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Authoritative unit price at this moment: the sale price when one is
    /// set, the list price otherwise.
    pub fn effective_price(&self) -> Decimal {
        if self.sale_price > Decimal::ZERO {
            self.sale_price
        } else {
            self.price
        }
    }
}
