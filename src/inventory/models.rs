use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// How an ingredient participates in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IngredientKind {
    /// Raw input, consumed by recipes only
    Raw,
    /// Stocked item resold as-is through a linked product
    Resale,
}

impl IngredientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientKind::Raw => "raw",
            IngredientKind::Resale => "resale",
        }
    }
}

impl Default for IngredientKind {
    fn default() -> Self {
        IngredientKind::Raw
    }
}

impl std::fmt::Display for IngredientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a stocked ingredient
///
/// `quantity_on_hand` is fractional (kg, liters) and may be negative when
/// the inventory policy allows overselling.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    /// Free-form unit of measure, e.g. "kg", "un"
    pub unit: String,
    pub kind: IngredientKind,
    pub quantity_on_hand: f64,
    /// Reorder point for low-stock listings
    pub minimum_quantity: f64,
    /// Last purchase price, used for recipe costing
    pub unit_cost: Decimal,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating an ingredient
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIngredient {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: String,
    #[serde(default)]
    pub kind: IngredientKind,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Quantity must be non-negative"))]
    pub quantity_on_hand: f64,
    #[serde(default = "default_minimum")]
    #[validate(range(min = 0.0, message = "Minimum must be non-negative"))]
    pub minimum_quantity: f64,
    #[serde(default)]
    pub unit_cost: Decimal,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Request DTO for updating an ingredient; omitted fields are kept
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateIngredient {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: Option<String>,
    pub kind: Option<IngredientKind>,
    pub quantity_on_hand: Option<f64>,
    pub minimum_quantity: Option<f64>,
    pub unit_cost: Option<Decimal>,
    pub supplier_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

fn default_minimum() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&IngredientKind::Raw).unwrap(),
            "\"raw\""
        );
        assert_eq!(
            serde_json::to_string(&IngredientKind::Resale).unwrap(),
            "\"resale\""
        );
    }

    #[test]
    fn test_create_ingredient_defaults() {
        let json = r#"{"name": "Mozzarella", "unit": "kg"}"#;
        let payload: CreateIngredient = serde_json::from_str(json).unwrap();

        assert_eq!(payload.kind, IngredientKind::Raw);
        assert_eq!(payload.quantity_on_hand, 0.0);
        assert_eq!(payload.minimum_quantity, 1.0);
        assert_eq!(payload.unit_cost, Decimal::ZERO);
    }

    #[test]
    fn test_create_ingredient_rejects_negative_stock() {
        let payload = CreateIngredient {
            name: "Flour".to_string(),
            unit: "kg".to_string(),
            kind: IngredientKind::Raw,
            quantity_on_hand: -2.0,
            minimum_quantity: 1.0,
            unit_cost: Decimal::ZERO,
            supplier_name: None,
            expiry_date: None,
        };

        assert!(payload.validate().is_err());
    }
}
