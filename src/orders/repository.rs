use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::coupons::CouponRepository;
use crate::orders::{
    CustomerInfo, Order, OrderDetails, OrderError, OrderItem, OrderStatus,
};

const ORDER_COLUMNS: &str = "id, public_token, created_at, customer_name, customer_phone, \
                             customer_address, status, payment_method, total, delivery_fee, \
                             coupon_code, discount, delivery_method, notes, courier";

/// Line snapshot handed to the repository at checkout:
/// (product_name, product_id, quantity, unit_price, note)
pub type LineSnapshot = (String, Option<i32>, i32, Decimal, Option<String>);

/// Repository for order operations
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order with its lines, and the coupon usage when a
    /// coupon applied, in a single transaction
    pub async fn create(
        &self,
        customer: &CustomerInfo,
        payment_method: Option<&str>,
        total: Decimal,
        details: &OrderDetails,
        items: Vec<LineSnapshot>,
        coupon: Option<(i32, Decimal)>,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders
                (public_token, customer_name, customer_phone, customer_address, status,
                 payment_method, total, delivery_fee, coupon_code, discount,
                 delivery_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(OrderStatus::New)
        .bind(payment_method)
        .bind(total)
        .bind(details.delivery_fee)
        .bind(&details.coupon_code)
        .bind(details.discount)
        .bind(&details.delivery_method)
        .bind(&details.notes)
        .fetch_one(&mut *tx)
        .await?;

        for (product_name, product_id, quantity, unit_price, note) in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_name, product_id, quantity, unit_price, note)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id)
            .bind(&product_name)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(&note)
            .execute(&mut *tx)
            .await?;
        }

        // The usage audit row is written exactly once, at creation
        if let Some((coupon_id, discount)) = coupon {
            CouponRepository::record_usage(&mut tx, coupon_id, order.id, discount)
                .await
                .map_err(|e| OrderError::DatabaseError(e.to_string()))?;
        }

        tx.commit().await?;

        Ok(order)
    }

    pub async fn find_by_id(&self, order_id: i32) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Public tracking lookup by uuid token
    pub async fn find_by_token(&self, token: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE public_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lock an order row for the remainder of a transaction
    pub async fn find_by_id_for_update(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i32,
    ) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(order)
    }

    /// Open orders, oldest first, for the kitchen queue
    pub async fn find_open(&self) -> Result<Vec<Order>, OrderError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status NOT IN ('completed', 'cancelled') ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Completed orders, newest first
    pub async fn find_history(&self) -> Result<Vec<Order>, OrderError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status = 'completed' ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Plain status write with no side effects
    pub async fn update_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_status)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }

    /// Status write inside the completion transaction
    pub async fn update_status_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_status)
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }

    /// Staff correction of an order's total
    pub async fn update_total(&self, order_id: i32, total: Decimal) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET total = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(total)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }

    /// Assign the courier taking the order out
    pub async fn assign_courier(&self, order_id: i32, courier: &str) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET courier = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(courier)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }
}

/// Repository for order line operations
#[derive(Clone)]
pub struct OrderItemsRepository {
    pool: PgPool,
}

impl OrderItemsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_order_id(&self, order_id: i32) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_name, product_id, quantity, unit_price, note
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Line read inside the completion transaction
    pub async fn find_by_order_id_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i32,
    ) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_name, product_id, quantity, unit_price, note
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(items)
    }
}
