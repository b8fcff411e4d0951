// HTTP handlers for coupon endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::coupons::{
    engine, Coupon, CouponError, CreateCoupon, UpdateCoupon, ValidateCouponRequest,
    ValidateCouponResponse,
};
use crate::AppState;

/// Handler for GET /api/admin/coupons
pub async fn list_coupons_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Coupon>>, CouponError> {
    let coupons = state.coupon_repo.find_all().await?;
    Ok(Json(coupons))
}

/// Handler for POST /api/admin/coupons
pub async fn create_coupon_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateCoupon>,
) -> Result<(StatusCode, Json<Coupon>), CouponError> {
    payload
        .validate()
        .map_err(|e| CouponError::ValidationError(e.to_string()))?;

    let coupon = state.coupon_repo.create(payload).await?;
    state
        .activity
        .log("staff", &format!("Created coupon '{}'", coupon.code))
        .await;

    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Handler for PUT /api/admin/coupons/:id
pub async fn update_coupon_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCoupon>,
) -> Result<Json<Coupon>, CouponError> {
    payload
        .validate()
        .map_err(|e| CouponError::ValidationError(e.to_string()))?;

    let coupon = state.coupon_repo.update(id, payload).await?;
    state
        .activity
        .log("staff", &format!("Updated coupon '{}'", coupon.code))
        .await;

    Ok(Json(coupon))
}

/// Handler for DELETE /api/admin/coupons/:id
pub async fn delete_coupon_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CouponError> {
    state.coupon_repo.delete(id).await?;
    state
        .activity
        .log("staff", &format!("Deleted coupon #{id}"))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/coupons/validate
/// Public endpoint used by the cart before checkout
pub async fn validate_coupon_handler(
    State(state): State<AppState>,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, CouponError> {
    let code = request.code.trim().to_uppercase();

    let Some(coupon) = state.coupon_repo.find_by_code(&code).await? else {
        return Ok(Json(invalid("Unknown or expired coupon")));
    };

    let check = engine::validate_at(&coupon, Utc::now());
    if let Some(reason) = check.reason() {
        return Ok(Json(invalid(reason)));
    }

    Ok(Json(ValidateCouponResponse {
        valid: true,
        code: Some(coupon.code),
        kind: Some(coupon.kind),
        value: Some(coupon.value),
        description: coupon.description,
        reason: None,
    }))
}

fn invalid(reason: &str) -> ValidateCouponResponse {
    ValidateCouponResponse {
        valid: false,
        code: None,
        kind: None,
        value: None,
        description: None,
        reason: Some(reason.to_string()),
    }
}
