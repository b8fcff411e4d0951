use sqlx::{PgPool, Postgres, Transaction};

use crate::coupons::{Coupon, CouponError, CreateCoupon, UpdateCoupon};

const COUPON_COLUMNS: &str = "id, code, kind, value, description, active, valid_from, valid_until";

/// Repository for coupon operations
#[derive(Clone)]
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Coupon>, CouponError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Look a coupon up by its code, case-insensitively
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE UPPER(code) = UPPER($1)"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    pub async fn create(&self, payload: CreateCoupon) -> Result<Coupon, CouponError> {
        let value = rust_decimal::Decimal::try_from(payload.value)
            .map_err(|_| CouponError::ValidationError("Value is not a valid number".into()))?;

        if crate::db::check_duplicate_coupon_code(&self.pool, &payload.code)
            .await
            .map_err(|_| CouponError::DatabaseError("duplicate check failed".into()))?
        {
            return Err(CouponError::DuplicateCode(payload.code));
        }

        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            INSERT INTO coupons (code, kind, value, description, active, valid_from, valid_until)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7)
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(&payload.code)
        .bind(payload.kind)
        .bind(value)
        .bind(&payload.description)
        .bind(payload.active)
        .bind(payload.valid_from)
        .bind(payload.valid_until)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created coupon {}", coupon.code);
        Ok(coupon)
    }

    pub async fn update(&self, id: i32, payload: UpdateCoupon) -> Result<Coupon, CouponError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CouponError::NotFound(id))?;

        let value = match payload.value {
            Some(v) => rust_decimal::Decimal::try_from(v)
                .map_err(|_| CouponError::ValidationError("Value is not a valid number".into()))?,
            None => existing.value,
        };

        let updated = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            UPDATE coupons
            SET kind = $1, value = $2, description = $3, active = $4,
                valid_from = $5, valid_until = $6
            WHERE id = $7
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(payload.kind.unwrap_or(existing.kind))
        .bind(value)
        .bind(payload.description.or(existing.description))
        .bind(payload.active.unwrap_or(existing.active))
        .bind(payload.valid_from.or(existing.valid_from))
        .bind(payload.valid_until.or(existing.valid_until))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<(), CouponError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CouponError::NotFound(id));
        }

        Ok(())
    }

    /// Record a coupon's use by an order, inside the order's transaction
    ///
    /// The unique constraint on order_id makes the audit trail
    /// write-once per order.
    pub async fn record_usage(
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i32,
        order_id: i32,
        discount: rust_decimal::Decimal,
    ) -> Result<(), CouponError> {
        sqlx::query(
            "INSERT INTO coupon_usages (coupon_id, order_id, discount) VALUES ($1, $2, $3)",
        )
        .bind(coupon_id)
        .bind(order_id)
        .bind(discount)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
