use sqlx::PgPool;

use crate::inventory::{CreateIngredient, Ingredient, InventoryError, UpdateIngredient};

/// Repository for ingredient CRUD
#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

const INGREDIENT_COLUMNS: &str = "id, name, unit, kind, quantity_on_hand, minimum_quantity, \
                                  unit_cost, supplier_name, expiry_date, updated_at";

impl IngredientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Ingredient>, InventoryError> {
        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Ingredient>, InventoryError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    pub async fn create(&self, payload: CreateIngredient) -> Result<Ingredient, InventoryError> {
        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            INSERT INTO ingredients
                (name, unit, kind, quantity_on_hand, minimum_quantity, unit_cost,
                 supplier_name, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(&payload.name)
        .bind(&payload.unit)
        .bind(payload.kind)
        .bind(payload.quantity_on_hand)
        .bind(payload.minimum_quantity)
        .bind(payload.unit_cost)
        .bind(&payload.supplier_name)
        .bind(payload.expiry_date)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created ingredient {} ({})", ingredient.id, ingredient.name);
        Ok(ingredient)
    }

    /// Update an ingredient, keeping current values for omitted fields
    pub async fn update(
        &self,
        id: i32,
        payload: UpdateIngredient,
    ) -> Result<Ingredient, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(InventoryError::IngredientNotFound(id))?;

        let updated = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            UPDATE ingredients
            SET name = $1,
                unit = $2,
                kind = $3,
                quantity_on_hand = $4,
                minimum_quantity = $5,
                unit_cost = $6,
                supplier_name = $7,
                expiry_date = $8,
                updated_at = NOW()
            WHERE id = $9
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(payload.name.unwrap_or(existing.name))
        .bind(payload.unit.unwrap_or(existing.unit))
        .bind(payload.kind.unwrap_or(existing.kind))
        .bind(payload.quantity_on_hand.unwrap_or(existing.quantity_on_hand))
        .bind(payload.minimum_quantity.unwrap_or(existing.minimum_quantity))
        .bind(payload.unit_cost.unwrap_or(existing.unit_cost))
        .bind(payload.supplier_name.or(existing.supplier_name))
        .bind(payload.expiry_date.or(existing.expiry_date))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete an ingredient
    ///
    /// Fails with a conflict while recipe lines or purchase items still
    /// reference it; the schema enforces this with RESTRICT constraints.
    pub async fn delete(&self, id: i32) -> Result<(), InventoryError> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::IngredientNotFound(id));
        }

        tracing::info!("Deleted ingredient {}", id);
        Ok(())
    }
}
