use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use sea_orm::ActiveModelTrait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::order::OrderStatus;
use crate::models::order_aggregate::OrderAggregate;
use crate::models::order_entity::{self, Entity as Order};
use crate::models::order_item_entity::{self, Entity as OrderItem};

/// Durable store for order aggregates.
///
/// All functions are connection-generic: callers pass either the pool or an
/// open transaction, so multi-step flows (create order with several lookups,
/// mutate-then-save) stay atomic under one transaction boundary.
pub struct OrderRepository;

impl OrderRepository {
    /// Loads an order together with its full item collection.
    pub async fn load_with_items<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<OrderAggregate>, ServiceError> {
        let Some(order) = Order::find_by_id(id).one(conn).await? else {
            return Ok(None);
        };

        let items = OrderItem::find()
            .filter(order_item_entity::Column::OrderId.eq(id))
            .all(conn)
            .await?;

        Ok(Some(OrderAggregate::from_parts(order, items)))
    }

    /// Order headers in a given status, newest first, paginated.
    pub async fn find_by_status<C: ConnectionTrait>(
        conn: &C,
        status: OrderStatus,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order_entity::Model>, u64), ServiceError> {
        let paginator = Order::find()
            .filter(order_entity::Column::Status.eq(status))
            .order_by_desc(order_entity::Column::OrderDate)
            .paginate(conn, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    pub async fn order_number_exists<C: ConnectionTrait>(
        conn: &C,
        order_number: &str,
    ) -> Result<bool, ServiceError> {
        let count = Order::find()
            .filter(order_entity::Column::OrderNumber.eq(order_number))
            .count(conn)
            .await?;

        Ok(count > 0)
    }

    /// Upserts the header and replaces the full item collection.
    ///
    /// The aggregate is the unit of consistency: saving always rewrites all
    /// lines, so a partially mutated item set can never be persisted.
    pub async fn save<C: ConnectionTrait>(
        conn: &C,
        aggregate: &OrderAggregate,
    ) -> Result<(), ServiceError> {
        let header = aggregate
            .order
            .clone()
            .into_active_model()
            .reset_all();

        let exists = Order::find_by_id(aggregate.order.id).one(conn).await?.is_some();
        if exists {
            header.update(conn).await?;
        } else {
            header.insert(conn).await?;
        }

        OrderItem::delete_many()
            .filter(order_item_entity::Column::OrderId.eq(aggregate.order.id))
            .exec(conn)
            .await?;

        if !aggregate.items.is_empty() {
            let rows = aggregate
                .items
                .iter()
                .map(|item| item.clone().into_active_model().reset_all());
            OrderItem::insert_many(rows).exec(conn).await?;
        }

        Ok(())
    }
}
