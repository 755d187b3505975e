use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::order_aggregate::ProductSnapshot,
    models::product_entity::{self, Entity as Product},
};

/// Catalog lookup contract the order flows depend on: product identifier to
/// a `(name, unit price)` snapshot.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn lookup(&self, product_id: Uuid) -> Result<Option<ProductSnapshot>, ServiceError>;
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Product name must be between 1 and 100 characters"
    ))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Product name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<product_entity::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Fetches a product snapshot on an arbitrary connection, so order flows can
/// resolve products inside their own transaction.
pub async fn fetch_snapshot<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<Option<ProductSnapshot>, ServiceError> {
    let product = Product::find_by_id(product_id).one(conn).await?;

    Ok(product.map(|p| ProductSnapshot {
        product_id: p.id,
        name: p.name,
        unit_price: p.price,
    }))
}

/// Service for managing catalog products.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product_entity::Model, ServiceError> {
        request.validate()?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Product price cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let model = product_entity::Model {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            price: request.price.round_dp(2),
            category_id: request.category_id,
            created_at: now,
            updated_at: now,
        };

        let created = model
            .clone()
            .into_active_model()
            .reset_all()
            .insert(&*self.db_pool)
            .await?;

        info!(product_id = %created.id, "product created");
        self.publish(Event::ProductCreated(created.id)).await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<product_entity::Model>, ServiceError> {
        Ok(Product::find_by_id(product_id).one(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ProductListResponse, ServiceError> {
        let paginator = Product::find()
            .order_by_asc(product_entity::Column::Name)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(ProductListResponse {
            products,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product_entity::Model, ServiceError> {
        request.validate()?;
        if matches!(request.price, Some(price) if price < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Product price cannot be negative".to_string(),
            ));
        }

        let product = Product::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })?;

        let mut active = product.into_active_model();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = request.price {
            active.price = Set(price.round_dp(2));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;

        info!(product_id = %product_id, "product updated");
        self.publish(Event::ProductUpdated(product_id)).await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(product_id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product with ID {} not found",
                product_id
            )));
        }

        info!(product_id = %product_id, "product deleted");
        self.publish(Event::ProductDeleted(product_id)).await;

        Ok(())
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to publish product event");
            }
        }
    }
}

#[async_trait]
impl ProductLookup for ProductService {
    async fn lookup(&self, product_id: Uuid) -> Result<Option<ProductSnapshot>, ServiceError> {
        fetch_snapshot(&*self.db_pool, product_id).await
    }
}
