use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command, db::DbPool, errors::ServiceError, events::EventSender,
    services::orders::OrderService,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CancelOrderCommand {
    pub order_id: Uuid,
    #[validate(length(min = 1, message = "A cancellation reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelOrderResult {
    pub order_number: String,
    pub status: String,
    pub message: String,
}

#[async_trait::async_trait]
impl Command for CancelOrderCommand {
    type Result = CancelOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let order = OrderService::new(db_pool, Some(event_sender))
            .cancel_order(self.order_id, &self.reason)
            .await?;

        Ok(CancelOrderResult {
            order_number: order.order_number,
            status: order.status,
            message: format!("Order cancelled. Reason: {}", self.reason),
        })
    }
}
