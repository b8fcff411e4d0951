use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for product and recipe operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Category not found: {0}")]
    CategoryNotFound(i32),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i32),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_foreign_key_violation() {
                return CatalogError::Conflict(
                    "Referenced record does not exist or is still in use".to_string(),
                );
            }
        }
        CatalogError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            CatalogError::DatabaseError(msg) => {
                tracing::error!("Catalog database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            CatalogError::ProductNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Product with id {} not found", id),
            ),
            CatalogError::CategoryNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Category with id {} not found", id),
            ),
            CatalogError::IngredientNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Ingredient with id {} not found", id),
            ),
            CatalogError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            CatalogError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
