use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::order::OrderStatus,
    models::order_aggregate::{generate_order_number, OrderAggregate},
    models::order_entity,
    repositories::OrderRepository,
    services::products,
};

/// Attempts before giving up on generating an unused order number.
const ORDER_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub discount_reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub total_items: i32,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service executing order lifecycle operations.
///
/// Every mutation runs begin transaction -> load aggregate -> rule engine ->
/// save -> commit, so either the whole operation lands or none of it does.
/// Concurrent edits to the same order are last-write-wins at the storage
/// layer; there is no optimistic-concurrency token in this version.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order from a list of product/quantity pairs.
    ///
    /// Product lookups, rule checks and the save all happen inside one
    /// transaction: a missing product part-way through rolls the whole order
    /// back.
    #[instrument(skip(self, request), fields(item_count = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let mut aggregate = OrderAggregate::create();
        Self::ensure_unused_order_number(&txn, &mut aggregate).await?;

        for line in &request.items {
            let snapshot = products::fetch_snapshot(&txn, line.product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product with ID {} not found",
                        line.product_id
                    ))
                })?;

            aggregate.add_item(&snapshot, line.quantity)?;
        }

        OrderRepository::save(&txn, &aggregate).await?;
        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %aggregate.order.id, "failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %aggregate.order.id,
            order_number = %aggregate.order.order_number,
            total = %aggregate.order.total_amount,
            "order created"
        );
        self.publish(Event::OrderCreated(aggregate.order.id)).await;

        Ok(CreateOrderResponse {
            id: aggregate.order.id,
            order_number: aggregate.order.order_number.clone(),
            subtotal: aggregate.order.subtotal,
            discount_amount: aggregate.order.discount_amount,
            tax_amount: aggregate.order.tax_amount,
            total_amount: aggregate.order.total_amount,
            discount_reason: aggregate.discount_rule().reason().to_string(),
        })
    }

    /// Adds a product to a draft order, merging into an existing line when
    /// the product is already present.
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let mut aggregate = Self::load_aggregate(&txn, order_id).await?;
        let snapshot = products::fetch_snapshot(&txn, product_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })?;

        aggregate.add_item(&snapshot, quantity)?;

        OrderRepository::save(&txn, &aggregate).await?;
        txn.commit().await?;

        info!(order_id = %order_id, product_id = %product_id, quantity = quantity, "item added to order");
        self.publish(Event::OrderItemAdded {
            order_id,
            product_id,
            quantity,
        })
        .await;

        Ok(Self::aggregate_to_response(&aggregate))
    }

    /// Removes a product line. Deliberately not restricted to draft orders;
    /// see the transition table.
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let mut aggregate = Self::load_aggregate(&txn, order_id).await?;
        aggregate.remove_item(product_id)?;

        OrderRepository::save(&txn, &aggregate).await?;
        txn.commit().await?;

        info!(order_id = %order_id, product_id = %product_id, "item removed from order");
        self.publish(Event::OrderItemRemoved {
            order_id,
            product_id,
        })
        .await;

        Ok(Self::aggregate_to_response(&aggregate))
    }

    /// Sets a line's quantity outright (not additive).
    #[instrument(skip(self), fields(order_id = %order_id, product_id = %product_id))]
    pub async fn update_item_quantity(
        &self,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let mut aggregate = Self::load_aggregate(&txn, order_id).await?;
        aggregate.update_item_quantity(product_id, quantity)?;

        OrderRepository::save(&txn, &aggregate).await?;
        txn.commit().await?;

        info!(order_id = %order_id, product_id = %product_id, quantity = quantity, "item quantity updated");
        self.publish(Event::OrderItemQuantityUpdated {
            order_id,
            product_id,
            quantity,
        })
        .await;

        Ok(Self::aggregate_to_response(&aggregate))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn submit_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        self.transition(order_id, Event::OrderSubmitted(order_id), |aggregate| {
            aggregate.submit()
        })
        .await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn approve_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        self.transition(order_id, Event::OrderApproved(order_id), |aggregate| {
            aggregate.approve()
        })
        .await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn ship_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        self.transition(order_id, Event::OrderShipped(order_id), |aggregate| {
            aggregate.ship()
        })
        .await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn deliver_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        self.transition(order_id, Event::OrderDelivered(order_id), |aggregate| {
            aggregate.deliver()
        })
        .await
    }

    #[instrument(skip(self, reason), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: &str,
    ) -> Result<OrderResponse, ServiceError> {
        self.transition(order_id, Event::OrderCancelled(order_id), |aggregate| {
            aggregate.cancel(reason)
        })
        .await
    }

    /// Retrieves an order with its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let aggregate = OrderRepository::load_with_items(&*self.db_pool, order_id).await?;
        Ok(aggregate.map(|a| Self::aggregate_to_response(&a)))
    }

    /// Lists order headers in a given status, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_by_status(
        &self,
        status: OrderStatus,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let (orders, total) =
            OrderRepository::find_by_status(&*self.db_pool, status, page, per_page).await?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(Self::model_to_summary).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Shared load-mutate-save-commit flow for pure status transitions.
    async fn transition<F>(
        &self,
        order_id: Uuid,
        event: Event,
        mutate: F,
    ) -> Result<OrderResponse, ServiceError>
    where
        F: FnOnce(&mut OrderAggregate) -> Result<(), crate::errors::DomainError>,
    {
        let txn = self.db_pool.begin().await?;

        let mut aggregate = Self::load_aggregate(&txn, order_id).await?;
        let old_status = aggregate.order.status;
        mutate(&mut aggregate)?;

        OrderRepository::save(&txn, &aggregate).await?;
        txn.commit().await?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %aggregate.order.status,
            "order status changed"
        );
        self.publish(event).await;

        Ok(Self::aggregate_to_response(&aggregate))
    }

    async fn load_aggregate<C: ConnectionTrait>(
        conn: &C,
        order_id: Uuid,
    ) -> Result<OrderAggregate, ServiceError> {
        OrderRepository::load_with_items(conn, order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order with ID {} not found", order_id)))
    }

    /// Regenerates the order number until it is unused. The unique column
    /// constraint stays the hard guarantee; this just keeps it from firing.
    async fn ensure_unused_order_number<C: ConnectionTrait>(
        conn: &C,
        aggregate: &mut OrderAggregate,
    ) -> Result<(), ServiceError> {
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            if !OrderRepository::order_number_exists(conn, &aggregate.order.order_number).await? {
                return Ok(());
            }
            warn!(order_number = %aggregate.order.order_number, "order number collision, regenerating");
            aggregate.order.order_number = generate_order_number();
        }

        Err(ServiceError::Conflict(
            "Could not generate a unique order number".to_string(),
        ))
    }

    fn aggregate_to_response(aggregate: &OrderAggregate) -> OrderResponse {
        OrderResponse {
            id: aggregate.order.id,
            order_number: aggregate.order.order_number.clone(),
            order_date: aggregate.order.order_date,
            status: aggregate.order.status.to_string(),
            subtotal: aggregate.order.subtotal,
            discount_amount: aggregate.order.discount_amount,
            tax_amount: aggregate.order.tax_amount,
            total_amount: aggregate.order.total_amount,
            notes: aggregate.order.notes.clone(),
            total_items: aggregate.total_quantity(),
            items: aggregate
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    line_total: item.line_total,
                })
                .collect(),
        }
    }

    fn model_to_summary(model: order_entity::Model) -> OrderSummary {
        OrderSummary {
            id: model.id,
            order_number: model.order_number,
            order_date: model.order_date,
            status: model.status.to_string(),
            total_amount: model.total_amount,
        }
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to publish order event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn aggregate_with_line() -> OrderAggregate {
        let mut aggregate = OrderAggregate::create();
        aggregate
            .add_item(
                &crate::models::order_aggregate::ProductSnapshot {
                    product_id: Uuid::new_v4(),
                    name: "Widget".to_string(),
                    unit_price: dec!(25.00),
                },
                2,
            )
            .unwrap();
        aggregate
    }

    #[test]
    fn aggregate_to_response_carries_totals_and_items() {
        let aggregate = aggregate_with_line();
        let response = OrderService::aggregate_to_response(&aggregate);

        assert_eq!(response.id, aggregate.order.id);
        assert_eq!(response.status, "Draft");
        assert_eq!(response.subtotal, dec!(50.00));
        assert_eq!(response.total_amount, dec!(55.00));
        assert_eq!(response.total_items, 2);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].line_total, dec!(50.00));
    }

    #[test]
    fn create_order_request_requires_items() {
        let request = CreateOrderRequest { items: vec![] };
        assert!(request.validate().is_err());
    }

    #[test]
    fn order_item_request_requires_positive_quantity() {
        let request = OrderItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(request.validate().is_err());
    }
}
