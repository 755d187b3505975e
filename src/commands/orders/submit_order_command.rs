use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::Command, db::DbPool, errors::ServiceError, events::EventSender,
    services::orders::OrderService,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOrderCommand {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOrderResult {
    pub order_number: String,
    pub status: String,
    pub total_amount: Decimal,
    pub message: String,
}

#[async_trait::async_trait]
impl Command for SubmitOrderCommand {
    type Result = SubmitOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let order = OrderService::new(db_pool, Some(event_sender))
            .submit_order(self.order_id)
            .await?;

        Ok(SubmitOrderResult {
            order_number: order.order_number,
            status: order.status,
            total_amount: order.total_amount,
            message: "Order submitted successfully. Awaiting approval.".to_string(),
        })
    }
}
