// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::orders::{
    AssignCourierRequest, OrderError, OrderResponse, SubmitOrderRequest, UpdateStatusRequest,
    UpdateTotalRequest,
};
use crate::AppState;

/// Handler for POST /api/orders
/// Public checkout submission
pub async fn submit_order_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state.order_service.submit_order(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "order_id": order.id,
            "public_token": order.public_token,
            "total": order.total,
        })),
    ))
}

/// Handler for GET /api/orders/:token
/// Public order tracking by uuid token
pub async fn track_order_handler(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state.order_service.get_order_by_token(token).await?;
    Ok(Json(order))
}

/// Handler for GET /api/admin/orders
/// Open orders, oldest first, for the kitchen queue
pub async fn list_open_orders_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, OrderError> {
    let orders = state.order_service.list_open().await?;
    Ok(Json(orders))
}

/// Handler for GET /api/admin/orders/history
/// Completed orders, newest first
pub async fn order_history_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, OrderError> {
    let orders = state.order_service.list_history().await?;
    Ok(Json(orders))
}

/// Handler for GET /api/admin/orders/:id
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state.order_service.get_order(id).await?;
    Ok(Json(order))
}

/// Handler for PATCH /api/admin/orders/:id/status
pub async fn transition_status_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state
        .order_service
        .transition_status(id, request.status)
        .await?;

    state
        .activity
        .log(
            "staff",
            &format!("Moved order #{} to {}", order.id, order.status),
        )
        .await;

    let items = state
        .order_items_repo
        .find_by_order_id(order.id)
        .await?;

    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// Handler for POST /api/admin/orders/:id/complete
/// Runs the completion unit of work: stock deduction, loyalty accrual and
/// the status change commit or roll back together
pub async fn complete_order_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state.order_service.complete_order(id).await?;

    state
        .activity
        .log("staff", &format!("Completed order #{}", order.id))
        .await;

    let items = state
        .order_items_repo
        .find_by_order_id(order.id)
        .await?;

    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// Handler for PATCH /api/admin/orders/:id/total
/// Staff correction of the order total
pub async fn update_total_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateTotalRequest>,
) -> Result<Json<OrderResponse>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state.order_service.update_total(id, request.total).await?;

    state
        .activity
        .log("staff", &format!("Corrected total of order #{}", order.id))
        .await;

    let items = state
        .order_items_repo
        .find_by_order_id(order.id)
        .await?;

    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// Handler for PATCH /api/admin/orders/:id/courier
pub async fn assign_courier_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AssignCourierRequest>,
) -> Result<Json<OrderResponse>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state
        .order_service
        .assign_courier(id, &request.courier)
        .await?;

    state
        .activity
        .log(
            "staff",
            &format!("Assigned courier {} to order #{}", request.courier, order.id),
        )
        .await;

    let items = state
        .order_items_repo
        .find_by_order_id(order.id)
        .await?;

    Ok(Json(OrderResponse::from_parts(order, items)))
}
