// HTTP handlers for ingredient and stock endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::inventory::{CreateIngredient, Ingredient, InventoryError, UpdateIngredient};
use crate::AppState;

/// Handler for GET /api/admin/ingredients
pub async fn list_ingredients_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Ingredient>>, InventoryError> {
    let ingredients = state.ingredient_repo.find_all().await?;
    Ok(Json(ingredients))
}

/// Handler for GET /api/admin/ingredients/:id
pub async fn get_ingredient_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Ingredient>, InventoryError> {
    let ingredient = state
        .ingredient_repo
        .find_by_id(id)
        .await?
        .ok_or(InventoryError::IngredientNotFound(id))?;

    Ok(Json(ingredient))
}

/// Handler for POST /api/admin/ingredients
pub async fn create_ingredient_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateIngredient>,
) -> Result<(StatusCode, Json<Ingredient>), InventoryError> {
    payload
        .validate()
        .map_err(|e| InventoryError::ValidationError(e.to_string()))?;

    let ingredient = state.ingredient_repo.create(payload).await?;
    state
        .activity
        .log("staff", &format!("Created ingredient '{}'", ingredient.name))
        .await;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// Handler for PUT /api/admin/ingredients/:id
pub async fn update_ingredient_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateIngredient>,
) -> Result<Json<Ingredient>, InventoryError> {
    payload
        .validate()
        .map_err(|e| InventoryError::ValidationError(e.to_string()))?;

    if let Some(quantity) = payload.quantity_on_hand {
        // Manual admin edits use the positive convention even though the
        // ledger itself tolerates negative balances
        crate::validation::validate_non_negative_quantity(quantity)
            .map_err(|_| InventoryError::ValidationError("Quantity must be non-negative".into()))?;
    }

    let ingredient = state.ingredient_repo.update(id, payload).await?;
    state
        .activity
        .log("staff", &format!("Updated ingredient '{}'", ingredient.name))
        .await;

    // Low-stock alerting is best-effort and never blocks the edit
    match state.stock_ledger.is_below_minimum(id).await {
        Ok(true) => tracing::warn!(
            "Ingredient '{}' is at or below its reorder point ({})",
            ingredient.name,
            ingredient.minimum_quantity
        ),
        Ok(false) => {}
        Err(e) => tracing::debug!("Low-stock check failed for ingredient {}: {}", id, e),
    }

    Ok(Json(ingredient))
}

/// Handler for DELETE /api/admin/ingredients/:id
pub async fn delete_ingredient_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, InventoryError> {
    state.ingredient_repo.delete(id).await?;
    state
        .activity
        .log("staff", &format!("Deleted ingredient #{id}"))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/admin/ingredients/low-stock
/// Lists ingredients at or below their reorder point
pub async fn low_stock_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Ingredient>>, InventoryError> {
    let ingredients = state.stock_ledger.low_stock().await?;
    tracing::debug!("{} ingredients at or below reorder point", ingredients.len());
    Ok(Json(ingredients))
}
