mod activity;
mod banners;
mod catalog;
mod coupons;
mod db;
mod error;
mod inventory;
mod loyalty;
mod models;
mod orders;
mod purchasing;
mod query;
mod reports;
mod reservations;
mod settings;
mod validation;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use error::ApiError;
use models::{Category, CreateCategory, UpdateCategory};
use settings::InventoryPolicy;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_category,
        get_all_categories,
        get_category_by_id,
        update_category,
        delete_category,
    ),
    components(
        schemas(Category, CreateCategory, UpdateCategory)
    ),
    tags(
        (name = "categories", description = "Menu category management endpoints")
    ),
    info(
        title = "Restaurant Back-Office API",
        version = "1.0.0",
        description = "RESTful API for menu, inventory, orders and loyalty management",
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub product_repo: catalog::ProductRepository,
    pub recipe_repo: catalog::RecipeRepository,
    pub ingredient_repo: inventory::IngredientRepository,
    pub stock_ledger: inventory::StockLedger,
    pub coupon_repo: coupons::CouponRepository,
    pub order_service: orders::OrderService,
    pub order_items_repo: orders::OrderItemsRepository,
    pub loyalty: loyalty::LoyaltyLedger,
    pub purchasing: purchasing::PurchasingRepository,
    pub reservations: reservations::ReservationRepository,
    pub banners: banners::BannerRepository,
    pub settings: settings::SettingsRepository,
    pub activity: activity::ActivityLogger,
}

impl AppState {
    fn new(db: PgPool) -> Self {
        let orders_repo = orders::OrdersRepository::new(db.clone());
        let order_items_repo = orders::OrderItemsRepository::new(db.clone());
        let product_repo = catalog::ProductRepository::new(db.clone());
        let coupon_repo = coupons::CouponRepository::new(db.clone());
        let settings = settings::SettingsRepository::new(db.clone());
        let stock_ledger = inventory::StockLedger::new(db.clone());

        let order_service = orders::OrderService::new(
            db.clone(),
            orders_repo,
            order_items_repo.clone(),
            product_repo.clone(),
            coupon_repo.clone(),
            settings.clone(),
            stock_ledger.clone(),
        );

        Self {
            product_repo,
            recipe_repo: catalog::RecipeRepository::new(db.clone()),
            ingredient_repo: inventory::IngredientRepository::new(db.clone()),
            stock_ledger,
            coupon_repo,
            order_service,
            order_items_repo,
            loyalty: loyalty::LoyaltyLedger::new(db.clone()),
            purchasing: purchasing::PurchasingRepository::new(db.clone()),
            reservations: reservations::ReservationRepository::new(db.clone()),
            banners: banners::BannerRepository::new(db.clone()),
            settings,
            activity: activity::ActivityLogger::new(db.clone()),
            db,
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, sort_order, visible, show_prices, photo_url";

/// Handler for POST /api/categories
/// Creates a new menu category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created successfully", body = Category),
        (status = 400, description = "Invalid input data", body = String, example = json!({"error": "Name must be 1-50 characters"})),
        (status = 409, description = "Duplicate category name", body = String, example = json!({"error": "Category with name 'Pizzas' already exists"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "categories"
)]
async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    tracing::debug!("Creating new category: {}", payload.name);

    payload.validate()?;

    if db::check_duplicate_category(&state.db, &payload.name).await? {
        tracing::warn!("Attempt to create duplicate category: {}", payload.name);
        return Err(ApiError::Conflict {
            message: format!("Category with name '{}' already exists", payload.name),
        });
    }

    let category = sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (name, sort_order, visible, show_prices, photo_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(payload.sort_order)
    .bind(payload.visible)
    .bind(payload.show_prices)
    .bind(&payload.photo_url)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created category with id: {}", category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for GET /api/categories
/// Retrieves all menu categories in display order
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of all categories", body = Vec<Category>),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "categories"
)]
async fn get_all_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order, name"
    ))
    .fetch_all(&state.db)
    .await?;

    tracing::debug!("Retrieved {} categories", categories.len());
    Ok(Json(categories))
}

/// Handler for GET /api/categories/:id
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, description = "Category not found", body = String, example = json!({"error": "Category with id 1 not found"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Database error"}))
    ),
    tag = "categories"
)]
async fn get_category_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>, ApiError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Category".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(category))
}

/// Handler for PUT /api/categories/:id
/// Updates an existing category, keeping omitted fields
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated successfully", body = Category),
        (status = 400, description = "Invalid input data", body = String),
        (status = 404, description = "Category not found", body = String),
        (status = 409, description = "Duplicate category name", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    tag = "categories"
)]
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategory>,
) -> Result<Json<Category>, ApiError> {
    payload.validate()?;

    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Category".to_string(),
        id: id.to_string(),
    })?;

    if let Some(ref new_name) = payload.name {
        if new_name != &existing.name
            && db::check_duplicate_category_excluding_id(&state.db, new_name, id).await?
        {
            tracing::warn!("Attempt to rename category {} to duplicate name: {}", id, new_name);
            return Err(ApiError::Conflict {
                message: format!("Category with name '{}' already exists", new_name),
            });
        }
    }

    let updated = sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories
        SET name = $1, sort_order = $2, visible = $3, show_prices = $4, photo_url = $5
        WHERE id = $6
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.sort_order.unwrap_or(existing.sort_order))
    .bind(payload.visible.unwrap_or(existing.visible))
    .bind(payload.show_prices.unwrap_or(existing.show_prices))
    .bind(payload.photo_url.or(existing.photo_url))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated category with id: {}", id);
    Ok(Json(updated))
}

/// Handler for DELETE /api/categories/:id
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted successfully"),
        (status = 404, description = "Category not found", body = String),
        (status = 409, description = "Category still has products", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    tag = "categories"
)]
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound {
            resource: "Category".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted category with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/admin/settings/inventory
async fn get_inventory_settings(
    State(state): State<AppState>,
) -> Result<Json<InventoryPolicy>, ApiError> {
    let policy = state.settings.inventory_policy().await?;
    Ok(Json(policy))
}

/// Handler for PUT /api/admin/settings/inventory
async fn update_inventory_settings(
    State(state): State<AppState>,
    Json(policy): Json<InventoryPolicy>,
) -> Result<Json<InventoryPolicy>, ApiError> {
    let updated = state.settings.update_inventory_policy(policy).await?;
    state
        .activity
        .log(
            "staff",
            &format!(
                "Changed inventory policy: enabled={}, allow_negative={}",
                updated.inventory_enabled, updated.allow_negative_stock
            ),
        )
        .await;

    Ok(Json(updated))
}

/// Handler for GET /api/admin/activity
async fn get_activity_log(
    State(state): State<AppState>,
) -> Result<Json<Vec<activity::ActivityEntry>>, ApiError> {
    let entries = state.activity.recent(200).await?;
    Ok(Json(entries))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let state = AppState::new(db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public endpoints
        .route("/api/menu", get(catalog::menu_handler))
        .route("/api/orders", post(orders::submit_order_handler))
        .route("/api/orders/:token", get(orders::track_order_handler))
        .route("/api/coupons/validate", post(coupons::validate_coupon_handler))
        .route("/api/loyalty/points", post(loyalty::get_points_handler))
        .route("/api/reservations", post(reservations::create_reservation_handler))
        .route("/api/banners", get(banners::list_active_banners_handler))
        // Categories
        .route("/api/categories", post(create_category))
        .route("/api/categories", get(get_all_categories))
        .route("/api/categories/:id", get(get_category_by_id))
        .route("/api/categories/:id", put(update_category))
        .route("/api/categories/:id", delete(delete_category))
        // Products and recipes
        .route("/api/admin/products", get(catalog::list_products_handler))
        .route("/api/admin/products", post(catalog::create_product_handler))
        .route("/api/admin/products/:id", get(catalog::get_product_handler))
        .route("/api/admin/products/:id", put(catalog::update_product_handler))
        .route("/api/admin/products/:id", delete(catalog::delete_product_handler))
        .route("/api/admin/recipes", post(catalog::upsert_recipe_handler))
        .route("/api/admin/recipes/:product_id", get(catalog::get_recipe_handler))
        .route(
            "/api/admin/recipes/:product_id/:ingredient_id",
            delete(catalog::remove_recipe_handler),
        )
        // Ingredients and stock
        .route("/api/admin/ingredients", get(inventory::list_ingredients_handler))
        .route("/api/admin/ingredients", post(inventory::create_ingredient_handler))
        .route("/api/admin/ingredients/low-stock", get(inventory::low_stock_handler))
        .route("/api/admin/ingredients/:id", get(inventory::get_ingredient_handler))
        .route("/api/admin/ingredients/:id", put(inventory::update_ingredient_handler))
        .route("/api/admin/ingredients/:id", delete(inventory::delete_ingredient_handler))
        // Orders
        .route("/api/admin/orders", get(orders::list_open_orders_handler))
        .route("/api/admin/orders/history", get(orders::order_history_handler))
        .route("/api/admin/orders/:id", get(orders::get_order_handler))
        .route("/api/admin/orders/:id/status", patch(orders::transition_status_handler))
        .route("/api/admin/orders/:id/complete", post(orders::complete_order_handler))
        .route("/api/admin/orders/:id/total", patch(orders::update_total_handler))
        .route("/api/admin/orders/:id/courier", patch(orders::assign_courier_handler))
        // Coupons
        .route("/api/admin/coupons", get(coupons::list_coupons_handler))
        .route("/api/admin/coupons", post(coupons::create_coupon_handler))
        .route("/api/admin/coupons/:id", put(coupons::update_coupon_handler))
        .route("/api/admin/coupons/:id", delete(coupons::delete_coupon_handler))
        // Loyalty
        .route("/api/admin/loyalty", get(loyalty::list_accounts_handler))
        .route("/api/admin/loyalty/add", post(loyalty::add_points_handler))
        .route("/api/admin/loyalty/set", post(loyalty::set_points_handler))
        // Purchasing
        .route("/api/admin/suppliers", get(purchasing::list_suppliers_handler))
        .route("/api/admin/suppliers", post(purchasing::create_supplier_handler))
        .route("/api/admin/suppliers/:id", delete(purchasing::delete_supplier_handler))
        .route("/api/admin/purchases", get(purchasing::list_purchases_handler))
        .route("/api/admin/purchases", post(purchasing::receive_purchase_handler))
        .route("/api/admin/purchases/:id/items", get(purchasing::purchase_items_handler))
        // Reservations
        .route("/api/admin/reservations", get(reservations::list_reservations_handler))
        .route(
            "/api/admin/reservations/:id/status",
            patch(reservations::update_reservation_status_handler),
        )
        // Banners
        .route("/api/admin/banners", get(banners::list_banners_handler))
        .route("/api/admin/banners", post(banners::create_banner_handler))
        .route("/api/admin/banners/:id", put(banners::update_banner_handler))
        .route("/api/admin/banners/:id", delete(banners::delete_banner_handler))
        // Reports
        .route("/api/admin/reports/orders-per-day", get(reports::orders_per_day_handler))
        .route("/api/admin/reports/category-sales", get(reports::category_sales_handler))
        .route("/api/admin/reports/top-customers", get(reports::top_customers_handler))
        // Settings and activity trail
        .route("/api/admin/settings/inventory", get(get_inventory_settings))
        .route("/api/admin/settings/inventory", put(update_inventory_settings))
        .route("/api/admin/activity", get(get_activity_log))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Restaurant API - Starting...");

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let app = create_router(db_pool);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Restaurant API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
