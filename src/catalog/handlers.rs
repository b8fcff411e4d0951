// HTTP handlers for products, recipes and the public menu

use std::collections::{BTreeMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::catalog::{
    CatalogError, CreateProduct, MenuItem, Product, RecipeItem, RecipeItemDetail, UpdateProduct,
    UpsertRecipeItem,
};
use crate::inventory::{availability_of, AvailabilityState};
use crate::query::{QueryParams, QueryValidator, SQLQueryBuilder};
use crate::AppState;

/// Handler for GET /api/admin/products
/// Supports search, category filter, price range, sorting, and pagination
pub async fn list_products_handler(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, CatalogError> {
    tracing::debug!("Listing products with query parameters: {:?}", params);

    let validated = QueryValidator::validate(params)
        .map_err(|e| CatalogError::ValidationError(e.to_string()))?;

    let mut builder = SQLQueryBuilder::new();

    if let Some(search) = validated.search {
        builder.add_search_filter(&search);
    }
    if let Some(category_id) = validated.category_id {
        builder.add_category_filter(category_id);
    }
    builder.add_price_range(validated.min_price, validated.max_price);

    if let Some(sort_field) = validated.sort_field {
        builder.set_sort(sort_field, validated.sort_order);
    }
    builder.set_pagination(validated.page, validated.limit);

    let (query_str, params) = builder.build();

    let mut query = sqlx::query_as::<_, Product>(&query_str);
    for param in params {
        query = query.bind(param);
    }

    let products = query.fetch_all(&state.db).await?;

    tracing::debug!("Query returned {} products", products.len());
    Ok(Json(products))
}

/// Handler for GET /api/admin/products/:id
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, CatalogError> {
    let product = state
        .product_repo
        .find_by_id(id)
        .await?
        .ok_or(CatalogError::ProductNotFound(id))?;

    Ok(Json(product))
}

/// Handler for POST /api/admin/products
pub async fn create_product_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), CatalogError> {
    payload
        .validate()
        .map_err(|e| CatalogError::ValidationError(e.to_string()))?;

    let product = state.product_repo.create(payload).await?;
    state
        .activity
        .log("staff", &format!("Created product '{}'", product.name))
        .await;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for PUT /api/admin/products/:id
pub async fn update_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<Product>, CatalogError> {
    payload
        .validate()
        .map_err(|e| CatalogError::ValidationError(e.to_string()))?;

    let product = state.product_repo.update(id, payload).await?;
    state
        .activity
        .log("staff", &format!("Updated product '{}'", product.name))
        .await;

    Ok(Json(product))
}

/// Handler for DELETE /api/admin/products/:id
pub async fn delete_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CatalogError> {
    state.product_repo.delete(id).await?;
    state
        .activity
        .log("staff", &format!("Deleted product #{id}"))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/admin/recipes/:product_id
pub async fn get_recipe_handler(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<RecipeItemDetail>>, CatalogError> {
    state
        .product_repo
        .find_by_id(product_id)
        .await?
        .ok_or(CatalogError::ProductNotFound(product_id))?;

    let lines = state.recipe_repo.for_product(product_id).await?;
    Ok(Json(lines))
}

/// Handler for POST /api/admin/recipes
/// Adds a recipe line, or updates the quantity when the pair already exists
pub async fn upsert_recipe_handler(
    State(state): State<AppState>,
    Json(payload): Json<UpsertRecipeItem>,
) -> Result<Json<RecipeItem>, CatalogError> {
    payload
        .validate()
        .map_err(|e| CatalogError::ValidationError(e.to_string()))?;

    state
        .product_repo
        .find_by_id(payload.product_id)
        .await?
        .ok_or(CatalogError::ProductNotFound(payload.product_id))?;

    let line = state.recipe_repo.upsert(&payload).await?;
    Ok(Json(line))
}

/// Handler for DELETE /api/admin/recipes/:product_id/:ingredient_id
pub async fn remove_recipe_handler(
    State(state): State<AppState>,
    Path((product_id, ingredient_id)): Path<(i32, i32)>,
) -> Result<StatusCode, CatalogError> {
    state.recipe_repo.remove(product_id, ingredient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/menu
///
/// Serves the public menu grouped by category. Availability rules: resale
/// products with no stock disappear; manufactured products with a depleted
/// recipe ingredient stay listed but flagged sold out. The manual sold-out
/// flag set by staff is honored regardless of policy.
pub async fn menu_handler(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Vec<MenuItem>>>, CatalogError> {
    let policy = state.settings.inventory_policy().await?;

    let categories: Vec<(i32, String)> = sqlx::query_as(
        "SELECT id, name FROM categories WHERE visible = TRUE ORDER BY sort_order",
    )
    .fetch_all(&state.db)
    .await?;

    let mut menu = BTreeMap::new();

    for (category_id, category_name) in categories {
        let products = state.product_repo.visible_by_category(category_id).await?;
        if products.is_empty() {
            continue;
        }

        // Resolve each product's stock linkage, then take one fresh stock
        // snapshot covering every ingredient the category touches
        let mut kinds = Vec::with_capacity(products.len());
        let mut ingredient_ids: HashSet<i32> = HashSet::new();
        for product in &products {
            let kind = state.product_repo.resolve_kind(product).await?;
            ingredient_ids.extend(kind.ingredient_ids());
            kinds.push(kind);
        }

        let ids: Vec<i32> = ingredient_ids.into_iter().collect();
        let stock = state
            .stock_ledger
            .stock_snapshot(&ids)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let mut items = Vec::new();
        for (product, kind) in products.into_iter().zip(kinds.iter()) {
            match availability_of(&policy, kind, &stock) {
                AvailabilityState::Unavailable => continue,
                availability => {
                    let sold_out =
                        product.sold_out || availability == AvailabilityState::SoldOut;
                    items.push(MenuItem {
                        id: product.id,
                        name: product.name,
                        description: product.description,
                        price: product.price,
                        photo_url: product.photo_url,
                        sold_out,
                    });
                }
            }
        }

        if !items.is_empty() {
            menu.insert(category_name, items);
        }
    }

    Ok(Json(menu))
}
