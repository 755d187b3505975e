//! Orderdesk API Library
//!
//! Order-management backend: catalog entities (categories, products) and a
//! shopping-order lifecycle with discount and tax computed at
//! order-mutation time. The core is the order aggregate's rule engine in
//! [`models::order_aggregate`]; persistence, events and the health surface
//! are wired around it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod models;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;

pub use errors::{DomainError, ServiceError};
pub use models::{OrderAggregate, OrderStatus, ProductSnapshot};

/// Shared application state handed to the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
}

impl AppState {
    pub fn order_service(&self) -> services::OrderService {
        services::OrderService::new(self.db.clone(), Some(Arc::new(self.event_sender.clone())))
    }

    pub fn product_service(&self) -> services::ProductService {
        services::ProductService::new(self.db.clone(), Some(Arc::new(self.event_sender.clone())))
    }

    pub fn category_service(&self) -> services::CategoryService {
        services::CategoryService::new(self.db.clone(), Some(Arc::new(self.event_sender.clone())))
    }
}

/// Liveness/readiness router. The order and catalog operations are exposed
/// through whatever RPC surface the deployment chooses; only health is part
/// of this crate.
pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match db::ping(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "connected",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "database": format!("unavailable: {}", e),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ),
    }
}
