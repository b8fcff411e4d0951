use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::inventory::Shortage;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Order not found")]
    NotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Order is already completed")]
    AlreadyCompleted,

    #[error("Insufficient stock for {} ingredient(s)", .0.len())]
    InsufficientStock(Vec<Shortage>),

    #[error("Coupon rejected: {0}")]
    CouponRejected(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl From<crate::inventory::InventoryError> for OrderError {
    fn from(err: crate::inventory::InventoryError) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl From<crate::loyalty::LoyaltyError> for OrderError {
    fn from(err: crate::loyalty::LoyaltyError) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl From<crate::catalog::CatalogError> for OrderError {
    fn from(err: crate::catalog::CatalogError) -> Self {
        match err {
            crate::catalog::CatalogError::ProductNotFound(id) => OrderError::ProductNotFound(id),
            other => OrderError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            OrderError::DatabaseError(msg) => {
                tracing::error!("Order database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "A database error occurred" }),
                )
            }
            OrderError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Order not found" }),
            ),
            OrderError::ProductNotFound(id) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Product with id {} not found", id) }),
            ),
            OrderError::InvalidQuantity(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            OrderError::InvalidTransition(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            OrderError::AlreadyCompleted => (
                StatusCode::CONFLICT,
                json!({ "error": "Order is already completed" }),
            ),
            OrderError::InsufficientStock(shortages) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Insufficient stock",
                    "shortages": shortages,
                }),
            ),
            OrderError::CouponRejected(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            OrderError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
