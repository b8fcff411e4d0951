use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for stock and ingredient operations
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i32),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            // Ingredients referenced by recipes or purchase history stay put
            if db_err.is_foreign_key_violation() {
                return InventoryError::Conflict(
                    "Ingredient is referenced by a recipe or purchase history".to_string(),
                );
            }
        }
        InventoryError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            InventoryError::DatabaseError(msg) => {
                tracing::error!("Inventory database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            InventoryError::IngredientNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Ingredient with id {} not found", id),
            ),
            InventoryError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            InventoryError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
