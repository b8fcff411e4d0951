use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// How a coupon's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Value is a percentage of the order total (e.g. 10 = 10% off)
    Percentage,
    /// Value is a fixed amount subtracted from the total
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a discount coupon
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: i32,
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub description: Option<String>,
    pub active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Audit row recording which order used which coupon
/// Written at most once per order, at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CouponUsage {
    pub id: i32,
    pub coupon_id: i32,
    pub order_id: i32,
    pub discount: Decimal,
}

/// Request DTO for creating a coupon
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCoupon {
    #[validate(custom = "crate::validation::validate_coupon_code")]
    pub code: String,
    pub kind: DiscountKind,
    #[validate(range(min = 0.01, message = "Value must be a positive number"))]
    pub value: f64,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Request DTO for updating a coupon; omitted fields are kept
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCoupon {
    pub kind: Option<DiscountKind>,
    #[validate(range(min = 0.01, message = "Value must be a positive number"))]
    pub value: Option<f64>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Request DTO for the public validation endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// Response DTO for the public validation endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DiscountKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&DiscountKind::Percentage).unwrap(),
            "\"percentage\""
        );
        assert_eq!(serde_json::to_string(&DiscountKind::Fixed).unwrap(), "\"fixed\"");
    }

    #[test]
    fn test_create_coupon_code_validation() {
        let payload = CreateCoupon {
            code: "not valid!".to_string(),
            kind: DiscountKind::Fixed,
            value: 5.0,
            description: None,
            active: true,
            valid_from: None,
            valid_until: None,
        };

        assert!(payload.validate().is_err());
    }
}
