//! Back office core for an online shop: users, products, and orders
//! placed against a price snapshot of the catalog.

pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod repository;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::Uri, routing::get};

use crate::{
    error::AppError,
    routes::{create_api_router, doc::scalar_docs, health},
    state::AppState,
};

/// Full application router without the HTTP middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "no route matched");
    AppError::NotFound
}
