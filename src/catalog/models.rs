use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Stored product kind discriminator
///
/// The row only records which family a product belongs to; the resolved
/// [`ProductKind`] carries the stock linkage itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductFamily {
    /// Made in-house from a recipe
    Manufactured,
    /// Bought and resold as-is, tracked 1:1 against one ingredient
    Resale,
}

impl ProductFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductFamily::Manufactured => "manufactured",
            ProductFamily::Resale => "resale",
        }
    }
}

impl Default for ProductFamily {
    fn default() -> Self {
        ProductFamily::Manufactured
    }
}

impl std::fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a sellable product
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub photo_url: Option<String>,
    pub visible: bool,
    /// Manually flagged sold-out by staff, independent of stock
    pub sold_out: bool,
    pub kind: ProductFamily,
    /// Direct stock link, meaningful only for resale products
    pub ingredient_id: Option<i32>,
}

/// Recipe line linking a product to one required ingredient
///
/// Quantity is per unit sold. One row per (product, ingredient) pair;
/// re-adding a pair updates the quantity in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeItem {
    pub id: i32,
    pub product_id: i32,
    pub ingredient_id: i32,
    pub quantity: f64,
}

/// How a product's sellable quantity is governed, resolved from the row
/// plus its recipe lines
///
/// - `Resale`: availability tracks one linked ingredient 1:1
/// - `Manufactured`: availability is the minimum across recipe ingredients
/// - `Untracked`: no stock tracking applies (no link, or an empty recipe)
#[derive(Debug, Clone, PartialEq)]
pub enum ProductKind {
    Resale { ingredient_id: i32 },
    Manufactured { recipe: Vec<RecipeLine> },
    Untracked,
}

/// One resolved bill-of-materials entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecipeLine {
    pub ingredient_id: i32,
    /// Required quantity per unit sold
    pub quantity: f64,
}

impl ProductKind {
    /// Ingredient ids this kind draws stock from
    pub fn ingredient_ids(&self) -> Vec<i32> {
        match self {
            ProductKind::Resale { ingredient_id } => vec![*ingredient_id],
            ProductKind::Manufactured { recipe } => {
                recipe.iter().map(|line| line.ingredient_id).collect()
            }
            ProductKind::Untracked => Vec::new(),
        }
    }
}

/// Request DTO for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    pub category_id: i32,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.01, message = "Price must be a positive number"))]
    pub price: f64,
    pub photo_url: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub sold_out: bool,
    #[serde(default)]
    pub kind: ProductFamily,
    pub ingredient_id: Option<i32>,
}

/// Request DTO for updating a product; omitted fields are kept
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProduct {
    pub category_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.01, message = "Price must be a positive number"))]
    pub price: Option<f64>,
    pub photo_url: Option<String>,
    pub visible: Option<bool>,
    pub sold_out: Option<bool>,
    pub kind: Option<ProductFamily>,
    pub ingredient_id: Option<i32>,
}

/// Request DTO for adding or updating a recipe line
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertRecipeItem {
    pub product_id: i32,
    pub ingredient_id: i32,
    #[validate(range(min = 0.0, message = "Quantity must be non-negative"))]
    pub quantity: f64,
}

/// Menu entry as served to the public menu endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub photo_url: Option<String>,
    pub sold_out: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_family_serialization() {
        assert_eq!(
            serde_json::to_string(&ProductFamily::Manufactured).unwrap(),
            "\"manufactured\""
        );
        assert_eq!(
            serde_json::to_string(&ProductFamily::Resale).unwrap(),
            "\"resale\""
        );
    }

    #[test]
    fn test_product_kind_ingredient_ids() {
        let resale = ProductKind::Resale { ingredient_id: 7 };
        assert_eq!(resale.ingredient_ids(), vec![7]);

        let manufactured = ProductKind::Manufactured {
            recipe: vec![
                RecipeLine {
                    ingredient_id: 1,
                    quantity: 0.2,
                },
                RecipeLine {
                    ingredient_id: 2,
                    quantity: 0.05,
                },
            ],
        };
        assert_eq!(manufactured.ingredient_ids(), vec![1, 2]);

        assert!(ProductKind::Untracked.ingredient_ids().is_empty());
    }

    #[test]
    fn test_create_product_price_validation() {
        let payload = CreateProduct {
            category_id: 1,
            name: "Margherita".to_string(),
            description: None,
            price: 0.0,
            photo_url: None,
            visible: true,
            sold_out: false,
            kind: ProductFamily::Manufactured,
            ingredient_id: None,
        };

        assert!(payload.validate().is_err());
    }
}
