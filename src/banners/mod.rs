// Promotional banners for the public site

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::AppState;

/// Error types for banner operations
#[derive(Debug, thiserror::Error)]
pub enum BannerError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Banner not found: {0}")]
    NotFound(i32),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for BannerError {
    fn from(err: sqlx::Error) -> Self {
        BannerError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for BannerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            BannerError::DatabaseError(msg) => {
                tracing::error!("Banner database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            BannerError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Banner with id {} not found", id),
            ),
            BannerError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Banner row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Banner {
    pub id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub sort_order: i32,
    pub active: bool,
}

/// Request DTO for creating or replacing a banner
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertBanner {
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Image URL is required"))]
    pub image_url: String,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

const BANNER_COLUMNS: &str =
    "id, title, description, image_url, link_url, link_text, sort_order, active";

/// Repository for banners
#[derive(Clone)]
pub struct BannerRepository {
    pool: PgPool,
}

impl BannerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active banners in display order (public site)
    pub async fn find_active(&self) -> Result<Vec<Banner>, BannerError> {
        let banners = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners WHERE active = TRUE ORDER BY sort_order"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(banners)
    }

    pub async fn find_all(&self) -> Result<Vec<Banner>, BannerError> {
        let banners = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners ORDER BY sort_order"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(banners)
    }

    pub async fn create(&self, payload: UpsertBanner) -> Result<Banner, BannerError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            r#"
            INSERT INTO banners (title, description, image_url, link_url, link_text, sort_order, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BANNER_COLUMNS}
            "#
        ))
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.image_url)
        .bind(&payload.link_url)
        .bind(&payload.link_text)
        .bind(payload.sort_order)
        .bind(payload.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(banner)
    }

    pub async fn update(&self, id: i32, payload: UpsertBanner) -> Result<Banner, BannerError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            r#"
            UPDATE banners
            SET title = $1, description = $2, image_url = $3, link_url = $4,
                link_text = $5, sort_order = $6, active = $7
            WHERE id = $8
            RETURNING {BANNER_COLUMNS}
            "#
        ))
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.image_url)
        .bind(&payload.link_url)
        .bind(&payload.link_text)
        .bind(payload.sort_order)
        .bind(payload.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BannerError::NotFound(id))?;

        Ok(banner)
    }

    pub async fn delete(&self, id: i32) -> Result<(), BannerError> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BannerError::NotFound(id));
        }

        Ok(())
    }
}

/// Handler for GET /api/banners (public)
pub async fn list_active_banners_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Banner>>, BannerError> {
    let banners = state.banners.find_active().await?;
    Ok(Json(banners))
}

/// Handler for GET /api/admin/banners
pub async fn list_banners_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Banner>>, BannerError> {
    let banners = state.banners.find_all().await?;
    Ok(Json(banners))
}

/// Handler for POST /api/admin/banners
pub async fn create_banner_handler(
    State(state): State<AppState>,
    Json(payload): Json<UpsertBanner>,
) -> Result<(StatusCode, Json<Banner>), BannerError> {
    payload
        .validate()
        .map_err(|e| BannerError::ValidationError(e.to_string()))?;

    let banner = state.banners.create(payload).await?;
    Ok((StatusCode::CREATED, Json(banner)))
}

/// Handler for PUT /api/admin/banners/:id
pub async fn update_banner_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpsertBanner>,
) -> Result<Json<Banner>, BannerError> {
    payload
        .validate()
        .map_err(|e| BannerError::ValidationError(e.to_string()))?;

    let banner = state.banners.update(id, payload).await?;
    Ok(Json(banner))
}

/// Handler for DELETE /api/admin/banners/:id
pub async fn delete_banner_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BannerError> {
    state.banners.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
