use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::{Product, ProductKind, ProductRepository};
use crate::coupons::{self, CouponRepository};
use crate::inventory::{
    aggregate_requirements, find_shortages, Shortage, StockLedger,
};
use crate::loyalty::{self, LoyaltyLedger};
use crate::orders::{
    LineSnapshot, Order, OrderDetails, OrderError, OrderItemsRepository, OrderResponse,
    OrderStatus, OrdersRepository, StatusMachine, SubmitOrderRequest, TotalsCalculator,
};
use crate::settings::SettingsRepository;

/// Service for order business logic
///
/// Owns checkout validation and the completion unit of work; plain status
/// moves and staff corrections pass straight through to the repository.
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    orders_repo: OrdersRepository,
    order_items_repo: OrderItemsRepository,
    product_repo: ProductRepository,
    coupon_repo: CouponRepository,
    settings: SettingsRepository,
    stock_ledger: StockLedger,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        orders_repo: OrdersRepository,
        order_items_repo: OrderItemsRepository,
        product_repo: ProductRepository,
        coupon_repo: CouponRepository,
        settings: SettingsRepository,
        stock_ledger: StockLedger,
    ) -> Self {
        Self {
            pool,
            orders_repo,
            order_items_repo,
            product_repo,
            coupon_repo,
            settings,
            stock_ledger,
        }
    }

    /// Submit an order from the public checkout
    ///
    /// Validates the coupon, prices every line from the current catalog,
    /// runs checkout stock validation under the active policy, then
    /// persists order, lines and coupon usage in one transaction. Any
    /// failing line rejects the whole submission; there are no partial
    /// orders.
    pub async fn submit_order(&self, request: SubmitOrderRequest) -> Result<Order, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }

        let product_ids: Vec<i32> = request
            .items
            .iter()
            .map(|line| {
                if line.quantity <= 0 {
                    return Err(OrderError::InvalidQuantity(format!(
                        "Quantity must be positive, got {}",
                        line.quantity
                    )));
                }
                Ok(line.product_id)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let products = self.product_repo.find_by_ids(&product_ids).await?;
        let product_map: HashMap<i32, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();

        // Snapshot names and prices; the lines must survive later product edits
        let mut snapshots: Vec<LineSnapshot> = Vec::new();
        let mut subtotals = Vec::new();
        for line in &request.items {
            let product = product_map
                .get(&line.product_id)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            subtotals.push(TotalsCalculator::line_subtotal(line.quantity, product.price));
            snapshots.push((
                product.name.clone(),
                Some(product.id),
                line.quantity,
                product.price,
                line.note.clone(),
            ));
        }

        let subtotal = TotalsCalculator::order_subtotal(&subtotals);
        let delivery_fee = match request.delivery_fee {
            Some(fee) => Some(Decimal::try_from(fee).map_err(|_| {
                OrderError::ValidationError("Delivery fee is not a valid number".to_string())
            })?),
            None => None,
        };
        let gross = subtotal + delivery_fee.unwrap_or(Decimal::ZERO);

        // Server-side coupon validation; an invalid code rejects the
        // submission instead of being silently dropped
        let mut discount = Decimal::ZERO;
        let mut applied_coupon: Option<(i32, Decimal)> = None;
        let mut coupon_code = None;
        if let Some(code) = request
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let coupon = self
                .coupon_repo
                .find_by_code(code)
                .await
                .map_err(|e| OrderError::DatabaseError(e.to_string()))?
                .ok_or_else(|| {
                    OrderError::CouponRejected("Unknown or expired coupon".to_string())
                })?;

            let check = coupons::validate_at(&coupon, Utc::now());
            if let Some(reason) = check.reason() {
                return Err(OrderError::CouponRejected(reason.to_string()));
            }

            discount = coupons::discount_for(&coupon, gross);
            coupon_code = Some(coupon.code.clone());
            if discount > Decimal::ZERO {
                applied_coupon = Some((coupon.id, discount));
            }
        }

        let total = TotalsCalculator::order_total(subtotal, delivery_fee, discount);

        // Checkout-time stock validation, strict mode only
        let policy = self
            .settings
            .inventory_policy()
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;
        if policy.blocks_on_shortage() {
            let mut kinds: Vec<(ProductKind, i32)> = Vec::new();
            for line in &request.items {
                let product = &product_map[&line.product_id];
                let kind = self.product_repo.resolve_kind(product).await?;
                kinds.push((kind, line.quantity));
            }

            let requirements =
                aggregate_requirements(kinds.iter().map(|(kind, qty)| (kind, *qty)));
            let ids: Vec<i32> = requirements.keys().copied().collect();
            let stock = self.stock_ledger.stock_snapshot(&ids).await?;

            let shortages = find_shortages(&requirements, &stock);
            if !shortages.is_empty() {
                let named = self.name_shortages(shortages).await?;
                return Err(OrderError::InsufficientStock(named));
            }
        }

        let details = OrderDetails {
            delivery_fee,
            coupon_code,
            discount: applied_coupon.map(|(_, d)| d),
            delivery_method: request.delivery_method.clone(),
            notes: request.notes.clone(),
            courier: None,
        };

        let order = self
            .orders_repo
            .create(
                &request.customer,
                request.payment_method.as_deref(),
                total,
                &details,
                snapshots,
                applied_coupon,
            )
            .await?;

        tracing::info!("Order {} submitted, total {}", order.id, order.total);
        Ok(order)
    }

    /// Complete an order: the one transition with side effects
    ///
    /// In a single transaction: re-validates stock under the current policy
    /// (strict mode rejects and leaves the order untouched), deducts every
    /// line's required ingredients, accrues loyalty points for the
    /// customer's phone, and marks the order completed. A failure at any
    /// step rolls the whole unit back.
    ///
    /// Re-completing a completed order returns `AlreadyCompleted`; points
    /// and stock are never applied twice.
    pub async fn complete_order(&self, order_id: i32) -> Result<Order, OrderError> {
        let policy = self
            .settings
            .inventory_policy()
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let order = OrdersRepository::find_by_id_for_update(&mut tx, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        match order.status {
            OrderStatus::Completed => return Err(OrderError::AlreadyCompleted),
            OrderStatus::Cancelled => {
                return Err(OrderError::InvalidTransition(
                    "Cancelled orders cannot be completed".to_string(),
                ))
            }
            _ => {}
        }

        let items = OrderItemsRepository::find_by_order_id_tx(&mut tx, order_id).await?;

        // Resolve stock linkage per line; lines whose product was deleted
        // keep their snapshot but no longer draw stock
        let mut kinds: Vec<(ProductKind, i32)> = Vec::new();
        for item in &items {
            if let Some(product_id) = item.product_id {
                if let Some(product) = self.product_repo.find_by_id(product_id).await? {
                    let kind = self.product_repo.resolve_kind(&product).await?;
                    kinds.push((kind, item.quantity));
                }
            }
        }

        let requirements = aggregate_requirements(kinds.iter().map(|(kind, qty)| (kind, *qty)));
        let mut ids: Vec<i32> = requirements.keys().copied().collect();
        ids.sort_unstable();

        // Row locks close the window between re-validation and deduction:
        // a racing completion waits here and then sees our decrements
        let locked = StockLedger::lock_for_update(&mut tx, &ids).await?;
        let stock: HashMap<i32, f64> = locked
            .iter()
            .map(|row| (row.id, row.quantity_on_hand))
            .collect();
        let names: HashMap<i32, String> = locked
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect();

        if policy.blocks_on_shortage() {
            let mut shortages = find_shortages(&requirements, &stock);
            if !shortages.is_empty() {
                for shortage in &mut shortages {
                    shortage.ingredient_name = names.get(&shortage.ingredient_id).cloned();
                }
                return Err(OrderError::InsufficientStock(shortages));
            }
        }

        for id in &ids {
            let new_quantity = StockLedger::adjust(&mut tx, *id, -requirements[id]).await?;
            tracing::debug!(
                "Order {}: ingredient {} adjusted to {}",
                order_id,
                id,
                new_quantity
            );
        }

        // One point per whole currency unit, keyed by digits-only phone;
        // orders without a phone simply earn nothing
        if let Some(phone) = order.customer_phone.as_deref() {
            let normalized = loyalty::normalize_phone(phone);
            if !normalized.is_empty() {
                let points = loyalty::points_for_total(order.total)?;
                let balance = LoyaltyLedger::add_points_tx(&mut tx, &normalized, points).await?;
                tracing::info!(
                    "Order {}: awarded {} points to {}, balance {}",
                    order_id,
                    points,
                    normalized,
                    balance
                );
            }
        }

        let completed = OrdersRepository::update_status_tx(&mut tx, order_id, OrderStatus::Completed)
            .await?;

        tx.commit().await?;

        tracing::info!("Order {} completed", order_id);
        Ok(completed)
    }

    /// Update order status with no side effects
    ///
    /// Completion is special-cased through [`Self::complete_order`] so the
    /// stock and loyalty unit of work cannot be bypassed by a plain status
    /// write.
    pub async fn transition_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        if new_status == OrderStatus::Completed {
            return self.complete_order(order_id).await;
        }

        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        StatusMachine::transition(order.status, new_status)
            .map_err(OrderError::InvalidTransition)?;

        self.orders_repo.update_status(order_id, new_status).await
    }

    /// Staff correction of an order's total
    pub async fn update_total(&self, order_id: i32, total: f64) -> Result<Order, OrderError> {
        crate::validation::validate_positive_price(total).map_err(|_| {
            OrderError::ValidationError("Total must be a positive number".to_string())
        })?;

        let total = Decimal::try_from(total)
            .map_err(|_| OrderError::ValidationError("Total is not a valid number".to_string()))?;

        self.orders_repo.update_total(order_id, total).await
    }

    /// Assign the courier taking an order out
    pub async fn assign_courier(&self, order_id: i32, courier: &str) -> Result<Order, OrderError> {
        self.orders_repo.assign_courier(order_id, courier).await
    }

    /// One order with its lines
    pub async fn get_order(&self, order_id: i32) -> Result<OrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        let items = self.order_items_repo.find_by_order_id(order.id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    /// Public tracking lookup by token
    pub async fn get_order_by_token(&self, token: Uuid) -> Result<OrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_token(token)
            .await?
            .ok_or(OrderError::NotFound)?;

        let items = self.order_items_repo.find_by_order_id(order.id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    /// Open orders with lines, oldest first (kitchen queue)
    pub async fn list_open(&self) -> Result<Vec<OrderResponse>, OrderError> {
        self.with_items(self.orders_repo.find_open().await?).await
    }

    /// Completed orders with lines, newest first
    pub async fn list_history(&self) -> Result<Vec<OrderResponse>, OrderError> {
        self.with_items(self.orders_repo.find_history().await?).await
    }

    async fn with_items(&self, orders: Vec<Order>) -> Result<Vec<OrderResponse>, OrderError> {
        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.order_items_repo.find_by_order_id(order.id).await?;
            responses.push(OrderResponse::from_parts(order, items));
        }
        Ok(responses)
    }

    async fn name_shortages(&self, shortages: Vec<Shortage>) -> Result<Vec<Shortage>, OrderError> {
        let ids: Vec<i32> = shortages.iter().map(|s| s.ingredient_id).collect();
        let names = self.stock_ledger.ingredient_names(&ids).await?;

        Ok(shortages
            .into_iter()
            .map(|mut shortage| {
                shortage.ingredient_name = names.get(&shortage.ingredient_id).cloned();
                shortage
            })
            .collect())
    }
}
