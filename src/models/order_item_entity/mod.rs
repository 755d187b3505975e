use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::DomainError;
use crate::models::pricing;

/// Order line entity.
///
/// `product_name` and `unit_price` are snapshots taken when the line was
/// created; catalog changes never flow back into existing orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub order_id: Uuid,

    /// One line per product within an order.
    pub product_id: Uuid,

    pub product_name: String,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_price: Decimal,

    #[validate(range(min = 1))]
    pub quantity: i32,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub line_total: Decimal,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::models::order_entity::Entity",
        from = "Column::OrderId",
        to = "crate::models::order_entity::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<crate::models::order_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a new order line from a product snapshot.
    pub fn new(
        order_id: Uuid,
        product_id: Uuid,
        product_name: String,
        unit_price: Decimal,
        quantity: i32,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            product_name,
            unit_price,
            quantity,
            line_total: pricing::line_total(unit_price, quantity),
            created_at: now,
            updated_at: now,
        }
    }

    /// Additive merge used when the same product is added again.
    pub fn add_quantity(&mut self, additional: i32) {
        self.quantity += additional;
        self.update_line_total();
    }

    /// Replaces the quantity outright (not additive) and recomputes this
    /// line's total. Order-level recalculation is the caller's job.
    pub fn update_quantity(&mut self, new_quantity: i32) -> Result<(), DomainError> {
        if new_quantity <= 0 {
            return Err(DomainError::new("Quantity must be greater than zero"));
        }

        self.quantity = new_quantity;
        self.update_line_total();
        Ok(())
    }

    fn update_line_total(&mut self) {
        self.line_total = pricing::line_total(self.unit_price, self.quantity);
        self.updated_at = Utc::now();
    }
}
