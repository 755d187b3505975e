use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::orders::{OrderResponse, OrderService},
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddItemToOrderCommand {
    pub order_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[async_trait::async_trait]
impl Command for AddItemToOrderCommand {
    type Result = OrderResponse;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        OrderService::new(db_pool, Some(event_sender))
            .add_item(self.order_id, self.product_id, self.quantity)
            .await
    }
}
