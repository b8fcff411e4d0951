// Loyalty ledger
//
// Per-customer point balances keyed by phone number. Phones are normalized
// to their digits before every lookup or write so formatting differences
// never fragment a balance. Accrual happens once per completed order, inside
// the completion transaction; the admin overwrite is a separate audited path.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::AppState;

/// Error types for loyalty operations
#[derive(Debug, thiserror::Error)]
pub enum LoyaltyError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Phone number has no digits")]
    EmptyPhone,

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

impl From<sqlx::Error> for LoyaltyError {
    fn from(err: sqlx::Error) -> Self {
        LoyaltyError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            LoyaltyError::DatabaseError(msg) => {
                tracing::error!("Loyalty database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            LoyaltyError::EmptyPhone => (
                StatusCode::BAD_REQUEST,
                "Phone number must contain digits".to_string(),
            ),
            LoyaltyError::CalculationError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Customer loyalty balance row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyAccount {
    pub id: i32,
    pub phone: String,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

/// Strip everything but digits from a phone number
///
/// "(11) 99999-0000" and "11999990000" address the same account.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Points earned by a completed order: one per whole currency unit
pub fn points_for_total(total: Decimal) -> Result<i64, LoyaltyError> {
    total
        .floor()
        .to_string()
        .parse::<i64>()
        .map_err(|e| LoyaltyError::CalculationError(format!("Failed to convert points: {}", e)))
}

/// Loyalty ledger over the loyalty_accounts table
#[derive(Clone)]
pub struct LoyaltyLedger {
    pool: PgPool,
}

impl LoyaltyLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current balance for a phone number, 0 when no account exists
    pub async fn points(&self, phone: &str) -> Result<i64, LoyaltyError> {
        let normalized = normalize_phone(phone);
        if normalized.is_empty() {
            return Err(LoyaltyError::EmptyPhone);
        }

        let points: Option<i64> =
            sqlx::query_scalar("SELECT points FROM loyalty_accounts WHERE phone = $1")
                .bind(&normalized)
                .fetch_optional(&self.pool)
                .await?;

        Ok(points.unwrap_or(0))
    }

    /// Add points to an account, creating it on first accrual
    pub async fn add_points(&self, phone: &str, delta: i64) -> Result<i64, LoyaltyError> {
        let mut tx = self.pool.begin().await?;
        let total = Self::add_points_tx(&mut tx, phone, delta).await?;
        tx.commit().await?;
        Ok(total)
    }

    /// Accrual inside an existing transaction (order completion path)
    pub async fn add_points_tx(
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
        delta: i64,
    ) -> Result<i64, LoyaltyError> {
        let normalized = normalize_phone(phone);
        if normalized.is_empty() {
            return Err(LoyaltyError::EmptyPhone);
        }

        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO loyalty_accounts (phone, points)
            VALUES ($1, $2)
            ON CONFLICT (phone)
            DO UPDATE SET
                points = loyalty_accounts.points + $2,
                updated_at = NOW()
            RETURNING points
            "#,
        )
        .bind(&normalized)
        .bind(delta)
        .fetch_one(&mut **tx)
        .await?;

        Ok(total)
    }

    /// Absolute overwrite of an account's balance (admin correction)
    ///
    /// Distinct from the accrual path; callers are expected to write an
    /// activity entry alongside it.
    pub async fn set_points(&self, phone: &str, points: i64) -> Result<i64, LoyaltyError> {
        let normalized = normalize_phone(phone);
        if normalized.is_empty() {
            return Err(LoyaltyError::EmptyPhone);
        }

        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO loyalty_accounts (phone, points)
            VALUES ($1, $2)
            ON CONFLICT (phone)
            DO UPDATE SET points = $2, updated_at = NOW()
            RETURNING points
            "#,
        )
        .bind(&normalized)
        .bind(points)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Accounts ordered by balance, optionally filtered by phone substring
    pub async fn search(&self, phone_fragment: Option<&str>) -> Result<Vec<LoyaltyAccount>, LoyaltyError> {
        let accounts = match phone_fragment {
            Some(fragment) => {
                sqlx::query_as::<_, LoyaltyAccount>(
                    r#"
                    SELECT id, phone, points, updated_at
                    FROM loyalty_accounts
                    WHERE phone LIKE '%' || $1 || '%'
                    ORDER BY points DESC
                    "#,
                )
                .bind(normalize_phone(fragment))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, LoyaltyAccount>(
                    "SELECT id, phone, points, updated_at FROM loyalty_accounts ORDER BY points DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(accounts)
    }
}

/// Request DTO for the public balance endpoint
#[derive(Debug, Deserialize)]
pub struct PointsRequest {
    pub phone: String,
}

/// Request DTO for the admin adjustment endpoint
#[derive(Debug, Deserialize)]
pub struct AdjustPointsRequest {
    pub phone: String,
    pub points: i64,
}

/// Query parameters for the admin listing
#[derive(Debug, Deserialize)]
pub struct LoyaltySearchQuery {
    pub q: Option<String>,
}

/// Handler for POST /api/loyalty/points
/// Public balance lookup by phone number
pub async fn get_points_handler(
    State(state): State<AppState>,
    Json(request): Json<PointsRequest>,
) -> Result<Json<serde_json::Value>, LoyaltyError> {
    let points = state.loyalty.points(&request.phone).await?;
    Ok(Json(json!({ "points": points })))
}

/// Handler for GET /api/admin/loyalty
pub async fn list_accounts_handler(
    State(state): State<AppState>,
    Query(query): Query<LoyaltySearchQuery>,
) -> Result<Json<Vec<LoyaltyAccount>>, LoyaltyError> {
    let accounts = state.loyalty.search(query.q.as_deref()).await?;
    Ok(Json(accounts))
}

/// Handler for POST /api/admin/loyalty/add
/// Relative adjustment, e.g. a goodwill grant
pub async fn add_points_handler(
    State(state): State<AppState>,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<serde_json::Value>, LoyaltyError> {
    let new_total = state.loyalty.add_points(&request.phone, request.points).await?;
    state
        .activity
        .log(
            "staff",
            &format!(
                "Adjusted loyalty balance of {} by {} points",
                normalize_phone(&request.phone),
                request.points
            ),
        )
        .await;

    Ok(Json(json!({ "new_total": new_total })))
}

/// Handler for POST /api/admin/loyalty/set
/// Absolute overwrite of a customer's balance
pub async fn set_points_handler(
    State(state): State<AppState>,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<serde_json::Value>, LoyaltyError> {
    let new_total = state.loyalty.set_points(&request.phone, request.points).await?;
    state
        .activity
        .log(
            "staff",
            &format!(
                "Set loyalty balance of {} to {} points",
                normalize_phone(&request.phone),
                request.points
            ),
        )
        .await;

    Ok(Json(json!({ "new_total": new_total })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_strips_formatting() {
        assert_eq!(normalize_phone("(11) 99999-0000"), "11999990000");
        assert_eq!(normalize_phone("11999990000"), "11999990000");
    }

    #[test]
    fn test_formatted_and_plain_phones_collide() {
        // Both spellings must resolve to the same account key
        assert_eq!(
            normalize_phone("(11) 99999-0000"),
            normalize_phone("11999990000")
        );
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_phone("no digits"), "");
    }

    #[test]
    fn test_points_floor_whole_total() {
        assert_eq!(points_for_total(dec!(42.00)).unwrap(), 42);
    }

    #[test]
    fn test_points_floor_fractional_total() {
        assert_eq!(points_for_total(dec!(42.99)).unwrap(), 42);
    }

    #[test]
    fn test_points_zero_total() {
        assert_eq!(points_for_total(Decimal::ZERO).unwrap(), 0);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Normalization is idempotent and keeps only digits
    #[test]
    fn prop_normalize_idempotent() {
        proptest!(|(phone in "[0-9() +-]{0,20}")| {
            let once = normalize_phone(&phone);
            let twice = normalize_phone(&once);

            prop_assert_eq!(&once, &twice);
            prop_assert!(once.chars().all(|c| c.is_ascii_digit()));
        });
    }

    /// Points are the floor of the total: never more, short by less than one
    #[test]
    fn prop_points_are_floor() {
        proptest!(|(cents in 0u64..100_000_00)| {
            let total = Decimal::from(cents) / Decimal::from(100);
            let points = points_for_total(total).unwrap();

            prop_assert!(Decimal::from(points) <= total);
            prop_assert!(total - Decimal::from(points) < Decimal::ONE);
        });
    }
}
