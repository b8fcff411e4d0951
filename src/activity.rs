// Activity logger
//
// Records admin and kitchen actions to the append-only activity trail.
// Writes are best-effort and sit outside any business transaction: a failed
// log entry must never abort the operation it describes.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// Activity logger
#[derive(Clone)]
pub struct ActivityLogger {
    pool: PgPool,
}

impl ActivityLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an action, swallowing failures
    pub async fn log(&self, actor: &str, action: &str) {
        if let Err(e) = sqlx::query("INSERT INTO activity_log (actor, action) VALUES ($1, $2)")
            .bind(actor)
            .bind(action)
            .execute(&self.pool)
            .await
        {
            tracing::warn!("Failed to record activity '{}': {}", action, e);
        }
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, created_at, actor, action
            FROM activity_log
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

/// Activity trail entry
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct ActivityEntry {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub actor: String,
    pub action: String,
}
