// Purchasing
//
// Suppliers and purchase receipts. Receiving a purchase is the inbound
// counterpart of order completion: one transaction inserts the purchase with
// its items, increments each ingredient's stock, and overwrites its unit
// cost with the latest purchase price.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::inventory::StockLedger;
use crate::orders::TotalsCalculator;
use crate::AppState;

/// Error types for purchasing operations
#[derive(Debug, thiserror::Error)]
pub enum PurchasingError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Supplier not found: {0}")]
    SupplierNotFound(i32),

    #[error("Purchase not found: {0}")]
    PurchaseNotFound(i32),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i32),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for PurchasingError {
    fn from(err: sqlx::Error) -> Self {
        PurchasingError::DatabaseError(err.to_string())
    }
}

impl From<crate::inventory::InventoryError> for PurchasingError {
    fn from(err: crate::inventory::InventoryError) -> Self {
        match err {
            crate::inventory::InventoryError::IngredientNotFound(id) => {
                PurchasingError::IngredientNotFound(id)
            }
            other => PurchasingError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for PurchasingError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PurchasingError::DatabaseError(msg) => {
                tracing::error!("Purchasing database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            PurchasingError::SupplierNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Supplier with id {} not found", id),
            ),
            PurchasingError::PurchaseNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Purchase with id {} not found", id),
            ),
            PurchasingError::IngredientNotFound(id) => (
                StatusCode::BAD_REQUEST,
                format!("Ingredient with id {} not found", id),
            ),
            PurchasingError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Supplier row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: i32,
    pub company_name: String,
    pub tax_id: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Purchase header row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: i32,
    pub supplier_id: Option<i32>,
    pub purchased_at: DateTime<Utc>,
    pub invoice_number: Option<String>,
    pub total: Decimal,
    pub note: Option<String>,
}

/// Purchase line row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseItem {
    pub id: i32,
    pub purchase_id: i32,
    pub ingredient_id: i32,
    pub quantity: f64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Request DTO for creating a supplier
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplier {
    #[validate(length(min = 1, max = 100, message = "Company name is required"))]
    pub company_name: String,
    pub tax_id: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

/// Request DTO for one received purchase line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReceiveItem {
    pub ingredient_id: i32,
    #[validate(range(min = 0.000001, message = "Quantity must be positive"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "Unit price must be non-negative"))]
    pub unit_price: f64,
}

/// Request DTO for receiving a purchase
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReceivePurchase {
    pub supplier_id: Option<i32>,
    pub invoice_number: Option<String>,
    pub note: Option<String>,
    #[validate(length(min = 1, message = "Purchase must contain at least one item"))]
    pub items: Vec<ReceiveItem>,
}

/// Repository for suppliers and purchase receipts
#[derive(Clone)]
pub struct PurchasingRepository {
    pool: PgPool,
}

impl PurchasingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, PurchasingError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, company_name, tax_id, contact_name, phone, email, created_at \
             FROM suppliers ORDER BY company_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    pub async fn create_supplier(&self, payload: CreateSupplier) -> Result<Supplier, PurchasingError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (company_name, tax_id, contact_name, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_name, tax_id, contact_name, phone, email, created_at
            "#,
        )
        .bind(&payload.company_name)
        .bind(&payload.tax_id)
        .bind(&payload.contact_name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn delete_supplier(&self, id: i32) -> Result<(), PurchasingError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PurchasingError::SupplierNotFound(id));
        }

        Ok(())
    }

    pub async fn list_purchases(&self) -> Result<Vec<Purchase>, PurchasingError> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT id, supplier_id, purchased_at, invoice_number, total, note \
             FROM purchases ORDER BY purchased_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    pub async fn purchase_items(&self, purchase_id: i32) -> Result<Vec<PurchaseItem>, PurchasingError> {
        let items = sqlx::query_as::<_, PurchaseItem>(
            "SELECT id, purchase_id, ingredient_id, quantity, unit_price, subtotal \
             FROM purchase_items WHERE purchase_id = $1 ORDER BY id",
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Receive a purchase: persist it and apply it to stock atomically
    ///
    /// Every line increments its ingredient's quantity through the ledger
    /// and overwrites the ingredient's unit cost with this purchase's
    /// price. A bad line rolls the whole receipt back.
    pub async fn receive(&self, payload: ReceivePurchase) -> Result<Purchase, PurchasingError> {
        let mut subtotals = Vec::with_capacity(payload.items.len());
        let mut lines: Vec<(i32, f64, Decimal, Decimal)> = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let unit_price = Decimal::try_from(item.unit_price).map_err(|_| {
                PurchasingError::ValidationError("Unit price is not a valid number".to_string())
            })?;
            let quantity = Decimal::try_from(item.quantity).map_err(|_| {
                PurchasingError::ValidationError("Quantity is not a valid number".to_string())
            })?;
            let subtotal = unit_price * quantity;
            subtotals.push(subtotal);
            lines.push((item.ingredient_id, item.quantity, unit_price, subtotal));
        }
        let total = TotalsCalculator::order_subtotal(&subtotals);

        let mut tx = self.pool.begin().await?;

        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (supplier_id, invoice_number, total, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id, supplier_id, purchased_at, invoice_number, total, note
            "#,
        )
        .bind(payload.supplier_id)
        .bind(&payload.invoice_number)
        .bind(total)
        .bind(&payload.note)
        .fetch_one(&mut *tx)
        .await?;

        for (ingredient_id, quantity, unit_price, subtotal) in lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (purchase_id, ingredient_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(purchase.id)
            .bind(ingredient_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(subtotal)
            .execute(&mut *tx)
            .await?;

            StockLedger::adjust(&mut tx, ingredient_id, quantity).await?;

            // Latest purchase price becomes the costing price
            sqlx::query("UPDATE ingredients SET unit_cost = $1 WHERE id = $2")
                .bind(unit_price)
                .bind(ingredient_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("Received purchase {} worth {}", purchase.id, purchase.total);
        Ok(purchase)
    }
}

/// Handler for GET /api/admin/suppliers
pub async fn list_suppliers_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Supplier>>, PurchasingError> {
    let suppliers = state.purchasing.list_suppliers().await?;
    Ok(Json(suppliers))
}

/// Handler for POST /api/admin/suppliers
pub async fn create_supplier_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplier>,
) -> Result<(StatusCode, Json<Supplier>), PurchasingError> {
    payload
        .validate()
        .map_err(|e| PurchasingError::ValidationError(e.to_string()))?;

    let supplier = state.purchasing.create_supplier(payload).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Handler for DELETE /api/admin/suppliers/:id
pub async fn delete_supplier_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, PurchasingError> {
    state.purchasing.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/admin/purchases
pub async fn list_purchases_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Purchase>>, PurchasingError> {
    let purchases = state.purchasing.list_purchases().await?;
    Ok(Json(purchases))
}

/// Handler for GET /api/admin/purchases/:id/items
pub async fn purchase_items_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<PurchaseItem>>, PurchasingError> {
    let items = state.purchasing.purchase_items(id).await?;
    Ok(Json(items))
}

/// Handler for POST /api/admin/purchases
/// Receives a purchase and applies it to stock
pub async fn receive_purchase_handler(
    State(state): State<AppState>,
    Json(payload): Json<ReceivePurchase>,
) -> Result<(StatusCode, Json<Purchase>), PurchasingError> {
    payload
        .validate()
        .map_err(|e| PurchasingError::ValidationError(e.to_string()))?;

    let purchase = state.purchasing.receive(payload).await?;
    state
        .activity
        .log(
            "staff",
            &format!("Received purchase #{} ({})", purchase.id, purchase.total),
        )
        .await;

    Ok((StatusCode::CREATED, Json(purchase)))
}
