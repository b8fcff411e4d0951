use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents a menu category in the database
///
/// Categories group products for the public menu and control their ordering
/// and visibility. Hidden categories keep their products but drop out of the
/// menu listing entirely.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Pizzas")]
    pub name: String,
    /// Position within the menu, lowest first
    #[schema(example = 0)]
    pub sort_order: i32,
    #[schema(example = true)]
    pub visible: bool,
    /// Whether the menu shows prices for this category
    #[schema(example = true)]
    pub show_prices: bool,
    #[schema(example = "/static/img/pizzas.jpg")]
    pub photo_url: Option<String>,
}

/// Represents the data needed to create a new category
///
/// Used for POST /api/categories requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Pizzas")]
    pub name: String,
    #[serde(default)]
    #[schema(example = 0)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    #[schema(example = true)]
    pub visible: bool,
    #[serde(default = "default_true")]
    #[schema(example = true)]
    pub show_prices: bool,
    #[schema(example = "/static/img/pizzas.jpg")]
    pub photo_url: Option<String>,
}

/// Represents the data for updating an existing category
///
/// All fields are optional; omitted fields keep their current values.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub visible: Option<bool>,
    pub show_prices: Option<bool>,
    pub photo_url: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_defaults() {
        let json = r#"{"name": "Drinks"}"#;
        let payload: CreateCategory = serde_json::from_str(json).unwrap();

        assert_eq!(payload.name, "Drinks");
        assert_eq!(payload.sort_order, 0);
        assert!(payload.visible);
        assert!(payload.show_prices);
        assert!(payload.photo_url.is_none());
    }

    #[test]
    fn test_create_category_name_validation() {
        let payload = CreateCategory {
            name: String::new(),
            sort_order: 0,
            visible: true,
            show_prices: true,
            photo_url: None,
        };

        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_update_category_partial() {
        let json = r#"{"visible": false}"#;
        let payload: UpdateCategory = serde_json::from_str(json).unwrap();

        assert!(payload.name.is_none());
        assert_eq!(payload.visible, Some(false));
    }
}
