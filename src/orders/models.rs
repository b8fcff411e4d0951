use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Preparing,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "new" => Ok(OrderStatus::New),
            "preparing" => Ok(OrderStatus::Preparing),
            "delivering" => Ok(OrderStatus::Delivering),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::New
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured order details that used to ride along as loose metadata
///
/// Each field is optional; together they describe how the order gets to the
/// customer and what was negotiated at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct OrderDetails {
    pub delivery_fee: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub discount: Option<Decimal>,
    pub delivery_method: Option<String>,
    pub notes: Option<String>,
    pub courier: Option<String>,
}

/// Domain model representing an order in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    /// Token for the public tracking link
    pub public_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub total: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: OrderDetails,
}

/// Domain model representing a line within an order
///
/// `product_name` is a snapshot taken at checkout so the line survives
/// later product deletion; `product_id` is the optional live link.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_name: String,
    pub product_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub note: Option<String>,
}

/// Customer identity captured at checkout
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 1, max = 100, message = "Customer name is required"))]
    pub name: String,
    #[validate(custom = "crate::validation::validate_phone")]
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Request DTO for one order line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub note: Option<String>,
}

/// Request DTO for submitting an order at checkout
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitOrderRequest {
    #[validate]
    pub customer: CustomerInfo,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineRequest>,
    pub coupon_code: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_method: Option<String>,
    #[validate(range(min = 0.0, message = "Delivery fee must be non-negative"))]
    pub delivery_fee: Option<f64>,
    pub notes: Option<String>,
}

/// Request DTO for updating order status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Request DTO for correcting an order's total
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTotalRequest {
    #[validate(range(min = 0.01, message = "Total must be a positive number"))]
    pub total: f64,
}

/// Request DTO for assigning a courier
#[derive(Debug, Deserialize, Validate)]
pub struct AssignCourierRequest {
    #[validate(length(min = 1, max = 100, message = "Courier name is required"))]
    pub courier: String,
}

/// Response DTO for an order with its lines
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub public_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub total: Decimal,
    #[serde(flatten)]
    pub details: OrderDetails,
    pub items: Vec<OrderItem>,
}

impl OrderResponse {
    pub fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            public_token: order.public_token,
            created_at: order.created_at,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            status: order.status,
            payment_method: order.payment_method,
            total: order.total,
            details: order.details,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::New,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Preparing.is_terminal());
        assert!(!OrderStatus::Delivering.is_terminal());
    }

    #[test]
    fn test_submit_request_requires_items() {
        use validator::Validate;

        let request = SubmitOrderRequest {
            customer: CustomerInfo {
                name: "Maria".to_string(),
                phone: None,
                address: None,
            },
            items: vec![],
            coupon_code: None,
            payment_method: None,
            delivery_method: None,
            delivery_fee: None,
            notes: None,
        };

        assert!(request.validate().is_err());
    }
}
