use sqlx::PgPool;

use crate::catalog::models::{
    CreateProduct, Product, ProductFamily, ProductKind, RecipeItem, RecipeLine, UpdateProduct,
    UpsertRecipeItem,
};
use crate::catalog::CatalogError;

const PRODUCT_COLUMNS: &str = "id, category_id, name, description, price, photo_url, visible, \
                               sold_out, kind, ingredient_id";

/// Repository for product operations
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>, CatalogError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Visible products of one visible category, menu order
    pub async fn visible_by_category(
        &self,
        category_id: i32,
    ) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE category_id = $1 AND visible = TRUE ORDER BY name"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn create(&self, payload: CreateProduct) -> Result<Product, CatalogError> {
        let price = rust_decimal::Decimal::try_from(payload.price)
            .map_err(|_| CatalogError::ValidationError("Price is not a valid number".into()))?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (category_id, name, description, price, photo_url, visible, sold_out,
                 kind, ingredient_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(payload.category_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(price)
        .bind(&payload.photo_url)
        .bind(payload.visible)
        .bind(payload.sold_out)
        .bind(payload.kind)
        .bind(payload.ingredient_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update(&self, id: i32, payload: UpdateProduct) -> Result<Product, CatalogError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CatalogError::ProductNotFound(id))?;

        let price = match payload.price {
            Some(p) => rust_decimal::Decimal::try_from(p)
                .map_err(|_| CatalogError::ValidationError("Price is not a valid number".into()))?,
            None => existing.price,
        };

        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET category_id = $1,
                name = $2,
                description = $3,
                price = $4,
                photo_url = $5,
                visible = $6,
                sold_out = $7,
                kind = $8,
                ingredient_id = $9
            WHERE id = $10
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(payload.category_id.unwrap_or(existing.category_id))
        .bind(payload.name.unwrap_or(existing.name))
        .bind(payload.description.or(existing.description))
        .bind(price)
        .bind(payload.photo_url.or(existing.photo_url))
        .bind(payload.visible.unwrap_or(existing.visible))
        .bind(payload.sold_out.unwrap_or(existing.sold_out))
        .bind(payload.kind.unwrap_or(existing.kind))
        .bind(payload.ingredient_id.or(existing.ingredient_id))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::ProductNotFound(id));
        }

        tracing::info!("Deleted product {}", id);
        Ok(())
    }

    /// Resolve how a product's stock is governed
    ///
    /// A resale row without its ingredient link, or a manufactured row with
    /// an empty recipe, resolves to `Untracked`: no stock tracking applies.
    pub async fn resolve_kind(&self, product: &Product) -> Result<ProductKind, CatalogError> {
        match product.kind {
            ProductFamily::Resale => Ok(match product.ingredient_id {
                Some(ingredient_id) => ProductKind::Resale { ingredient_id },
                None => ProductKind::Untracked,
            }),
            ProductFamily::Manufactured => {
                let lines: Vec<(i32, f64)> = sqlx::query_as(
                    "SELECT ingredient_id, quantity FROM recipe_items WHERE product_id = $1",
                )
                .bind(product.id)
                .fetch_all(&self.pool)
                .await?;

                if lines.is_empty() {
                    Ok(ProductKind::Untracked)
                } else {
                    Ok(ProductKind::Manufactured {
                        recipe: lines
                            .into_iter()
                            .map(|(ingredient_id, quantity)| RecipeLine {
                                ingredient_id,
                                quantity,
                            })
                            .collect(),
                    })
                }
            }
        }
    }
}

/// Recipe line joined with its ingredient for admin display
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct RecipeItemDetail {
    pub id: i32,
    pub ingredient_id: i32,
    pub ingredient_name: String,
    pub unit: String,
    pub quantity: f64,
}

/// Repository for recipe (bill-of-materials) lines
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_product(&self, product_id: i32) -> Result<Vec<RecipeItemDetail>, CatalogError> {
        let lines = sqlx::query_as::<_, RecipeItemDetail>(
            r#"
            SELECT r.id, r.ingredient_id, i.name AS ingredient_name, i.unit, r.quantity
            FROM recipe_items r
            JOIN ingredients i ON i.id = r.ingredient_id
            WHERE r.product_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Add a recipe line, or update the quantity when the pair exists
    pub async fn upsert(&self, payload: &UpsertRecipeItem) -> Result<RecipeItem, CatalogError> {
        let line = sqlx::query_as::<_, RecipeItem>(
            r#"
            INSERT INTO recipe_items (product_id, ingredient_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, ingredient_id)
            DO UPDATE SET quantity = $3
            RETURNING id, product_id, ingredient_id, quantity
            "#,
        )
        .bind(payload.product_id)
        .bind(payload.ingredient_id)
        .bind(payload.quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    pub async fn remove(&self, product_id: i32, ingredient_id: i32) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM recipe_items WHERE product_id = $1 AND ingredient_id = $2")
            .bind(product_id)
            .bind(ingredient_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
