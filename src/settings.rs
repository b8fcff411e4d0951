// Inventory policy settings
//
// The policy that governs availability checks lives in a singleton database
// row and is read fresh for each operation that needs it, then passed into
// the availability logic as a plain value. Nothing reads it ambiently.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Effective inventory policy for availability decisions
///
/// Four modes fall out of the two flags:
/// - disabled: no availability logic anywhere, everything sellable
/// - enabled + negative allowed: menu display flags only, never blocks
/// - enabled + strict: display flags AND checkout/fulfillment blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InventoryPolicy {
    pub inventory_enabled: bool,
    pub allow_negative_stock: bool,
}

impl InventoryPolicy {
    /// Whether menu listings should compute availability states at all
    pub fn checks_display(&self) -> bool {
        self.inventory_enabled
    }

    /// Whether checkout and fulfillment must block on insufficient stock
    pub fn blocks_on_shortage(&self) -> bool {
        self.inventory_enabled && !self.allow_negative_stock
    }
}

impl Default for InventoryPolicy {
    fn default() -> Self {
        Self {
            inventory_enabled: false,
            allow_negative_stock: true,
        }
    }
}

/// Repository for the app_settings singleton row
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the current inventory policy
    ///
    /// Falls back to the permissive default when the singleton row is
    /// missing.
    pub async fn inventory_policy(&self) -> Result<InventoryPolicy, sqlx::Error> {
        let policy = sqlx::query_as::<_, InventoryPolicy>(
            "SELECT inventory_enabled, allow_negative_stock FROM app_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(policy.unwrap_or_default())
    }

    /// Overwrite the inventory policy
    pub async fn update_inventory_policy(
        &self,
        policy: InventoryPolicy,
    ) -> Result<InventoryPolicy, sqlx::Error> {
        let updated = sqlx::query_as::<_, InventoryPolicy>(
            r#"
            INSERT INTO app_settings (id, inventory_enabled, allow_negative_stock, updated_at)
            VALUES (1, $1, $2, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                inventory_enabled = $1,
                allow_negative_stock = $2,
                updated_at = NOW()
            RETURNING inventory_enabled, allow_negative_stock
            "#,
        )
        .bind(policy.inventory_enabled)
        .bind(policy.allow_negative_stock)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Inventory policy updated: enabled={}, allow_negative={}",
            updated.inventory_enabled,
            updated.allow_negative_stock
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_policy_never_checks() {
        let policy = InventoryPolicy {
            inventory_enabled: false,
            allow_negative_stock: false,
        };

        assert!(!policy.checks_display());
        assert!(!policy.blocks_on_shortage());
    }

    #[test]
    fn test_negative_allowed_checks_display_only() {
        let policy = InventoryPolicy {
            inventory_enabled: true,
            allow_negative_stock: true,
        };

        assert!(policy.checks_display());
        assert!(!policy.blocks_on_shortage());
    }

    #[test]
    fn test_strict_mode_blocks() {
        let policy = InventoryPolicy {
            inventory_enabled: true,
            allow_negative_stock: false,
        };

        assert!(policy.checks_display());
        assert!(policy.blocks_on_shortage());
    }

    #[test]
    fn test_default_is_permissive() {
        let policy = InventoryPolicy::default();
        assert!(!policy.inventory_enabled);
        assert!(policy.allow_negative_stock);
    }
}
