use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::orders::{OrderResponse, OrderService},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ShipOrderCommand {
    pub order_id: Uuid,
}

#[async_trait::async_trait]
impl Command for ShipOrderCommand {
    type Result = OrderResponse;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        OrderService::new(db_pool, Some(event_sender))
            .ship_order(self.order_id)
            .await
    }
}
