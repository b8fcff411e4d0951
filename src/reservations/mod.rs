// Table reservations
//
// Customers book through the public endpoint; staff confirm, cancel or
// close reservations from the admin listing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::AppState;

/// Reservation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pending
    }
}

/// Error types for reservation operations
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Reservation not found: {0}")]
    NotFound(i32),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for ReservationError {
    fn from(err: sqlx::Error) -> Self {
        ReservationError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ReservationError::DatabaseError(msg) => {
                tracing::error!("Reservation database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ReservationError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Reservation with id {} not found", id),
            ),
            ReservationError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Reservation row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i32,
    pub customer_name: String,
    pub phone: String,
    pub reserved_date: NaiveDate,
    pub reserved_time: NaiveTime,
    pub party_size: i32,
    pub note: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for booking a reservation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReservation {
    #[validate(length(min = 1, max = 100, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(custom = "crate::validation::validate_phone")]
    pub phone: String,
    pub reserved_date: NaiveDate,
    pub reserved_time: NaiveTime,
    #[validate(range(min = 1, max = 50, message = "Party size must be between 1 and 50"))]
    pub party_size: i32,
    pub note: Option<String>,
}

/// Request DTO for updating a reservation's status
#[derive(Debug, Deserialize)]
pub struct UpdateReservationStatus {
    pub status: ReservationStatus,
}

const RESERVATION_COLUMNS: &str = "id, customer_name, phone, reserved_date, reserved_time, \
                                   party_size, note, status, created_at";

/// Repository for reservations
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All reservations, most recent first
    pub async fn find_all(&self) -> Result<Vec<Reservation>, ReservationError> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    pub async fn create(&self, payload: CreateReservation) -> Result<Reservation, ReservationError> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            INSERT INTO reservations
                (customer_name, phone, reserved_date, reserved_time, party_size, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(&payload.customer_name)
        .bind(&payload.phone)
        .bind(payload.reserved_date)
        .bind(payload.reserved_time)
        .bind(payload.party_size)
        .bind(&payload.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(reservation)
    }

    pub async fn update_status(
        &self,
        id: i32,
        status: ReservationStatus,
    ) -> Result<Reservation, ReservationError> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            "UPDATE reservations SET status = $1 WHERE id = $2 RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ReservationError::NotFound(id))?;

        Ok(reservation)
    }
}

/// Handler for POST /api/reservations (public booking)
pub async fn create_reservation_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateReservation>,
) -> Result<(StatusCode, Json<Reservation>), ReservationError> {
    payload
        .validate()
        .map_err(|e| ReservationError::ValidationError(e.to_string()))?;

    let reservation = state.reservations.create(payload).await?;
    tracing::info!(
        "Reservation {} booked for {} on {}",
        reservation.id,
        reservation.customer_name,
        reservation.reserved_date
    );

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Handler for GET /api/admin/reservations
pub async fn list_reservations_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Reservation>>, ReservationError> {
    let reservations = state.reservations.find_all().await?;
    Ok(Json(reservations))
}

/// Handler for PATCH /api/admin/reservations/:id/status
pub async fn update_reservation_status_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateReservationStatus>,
) -> Result<Json<Reservation>, ReservationError> {
    let reservation = state.reservations.update_status(id, request.status).await?;
    state
        .activity
        .log("staff", &format!("Updated reservation #{id} status"))
        .await;

    Ok(Json(reservation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
    }

    #[test]
    fn test_create_reservation_party_size_bounds() {
        let payload = CreateReservation {
            customer_name: "Ana".to_string(),
            phone: "11 98888-7777".to_string(),
            reserved_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            reserved_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            party_size: 0,
            note: None,
        };

        assert!(payload.validate().is_err());
    }
}
