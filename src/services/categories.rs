use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::category_entity::{self, Entity as Category},
    models::product_entity::{self, Entity as Product},
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Category name must be between 1 and 50 characters"
    ))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<category_entity::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing catalog categories.
#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category_entity::Model, ServiceError> {
        request.validate()?;

        let now = Utc::now();
        let model = category_entity::Model {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            created_at: now,
            updated_at: now,
        };

        let created = model
            .into_active_model()
            .reset_all()
            .insert(&*self.db_pool)
            .await?;

        info!(category_id = %created.id, "category created");
        self.publish(Event::CategoryCreated(created.id)).await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: Uuid,
    ) -> Result<Option<category_entity::Model>, ServiceError> {
        Ok(Category::find_by_id(category_id).one(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<CategoryListResponse, ServiceError> {
        let paginator = Category::find()
            .order_by_asc(category_entity::Column::Name)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await?;
        let categories = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(CategoryListResponse {
            categories,
            total,
            page,
            per_page,
        })
    }

    /// Deletes a category; rejected while any product still references it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let product_count = Product::find()
            .filter(product_entity::Column::CategoryId.eq(category_id))
            .count(&*self.db_pool)
            .await?;

        if product_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Cannot delete category with {} products",
                product_count
            )));
        }

        let result = Category::delete_by_id(category_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Category with ID {} not found",
                category_id
            )));
        }

        info!(category_id = %category_id, "category deleted");
        self.publish(Event::CategoryDeleted(category_id)).await;

        Ok(())
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to publish category event");
            }
        }
    }
}
