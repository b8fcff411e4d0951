// Coupon validity and discount math
//
// Pure functions over a loaded coupon row. The caller supplies `now` so the
// window checks are deterministic under test.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::coupons::{Coupon, DiscountKind};

/// Outcome of validating a coupon code at a point in time
#[derive(Debug, Clone, PartialEq)]
pub enum CouponCheck {
    Valid,
    Inactive,
    NotYetValid,
    Expired,
}

impl CouponCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, CouponCheck::Valid)
    }

    /// Customer-facing reason for a failed check
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            CouponCheck::Valid => None,
            CouponCheck::Inactive => Some("Coupon is not active"),
            CouponCheck::NotYetValid => Some("Coupon is not valid yet"),
            CouponCheck::Expired => Some("Coupon has expired"),
        }
    }
}

/// Check a coupon against its active flag and validity window
///
/// Absent bounds leave the window open on that side.
pub fn validate_at(coupon: &Coupon, now: DateTime<Utc>) -> CouponCheck {
    if !coupon.active {
        return CouponCheck::Inactive;
    }
    if let Some(valid_from) = coupon.valid_from {
        if now < valid_from {
            return CouponCheck::NotYetValid;
        }
    }
    if let Some(valid_until) = coupon.valid_until {
        if now > valid_until {
            return CouponCheck::Expired;
        }
    }
    CouponCheck::Valid
}

/// Compute the discount a coupon grants on an order total
///
/// Clamped so the discount never exceeds the total; the resulting order
/// total floors at zero.
pub fn discount_for(coupon: &Coupon, order_total: Decimal) -> Decimal {
    let raw = match coupon.kind {
        DiscountKind::Percentage => order_total * coupon.value / Decimal::from(100),
        DiscountKind::Fixed => coupon.value,
    };

    raw.min(order_total).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(kind: DiscountKind, value: Decimal) -> Coupon {
        Coupon {
            id: 1,
            code: "TEST".to_string(),
            kind,
            value,
            description: None,
            active: true,
            valid_from: None,
            valid_until: None,
        }
    }

    #[test]
    fn test_active_open_window_is_valid() {
        let c = coupon(DiscountKind::Fixed, dec!(5));
        assert!(validate_at(&c, Utc::now()).is_valid());
    }

    #[test]
    fn test_inactive_coupon_rejected() {
        let mut c = coupon(DiscountKind::Fixed, dec!(5));
        c.active = false;
        assert_eq!(validate_at(&c, Utc::now()), CouponCheck::Inactive);
    }

    #[test]
    fn test_expired_coupon_rejected() {
        let now = Utc::now();
        let mut c = coupon(DiscountKind::Percentage, dec!(10));
        c.valid_until = Some(now - Duration::days(1));
        assert_eq!(validate_at(&c, now), CouponCheck::Expired);
    }

    #[test]
    fn test_future_coupon_rejected() {
        let now = Utc::now();
        let mut c = coupon(DiscountKind::Percentage, dec!(10));
        c.valid_from = Some(now + Duration::hours(2));
        assert_eq!(validate_at(&c, now), CouponCheck::NotYetValid);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut c = coupon(DiscountKind::Fixed, dec!(5));
        c.valid_from = Some(now);
        c.valid_until = Some(now);
        assert!(validate_at(&c, now).is_valid());
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountKind::Percentage, dec!(10));
        assert_eq!(discount_for(&c, dec!(80.00)), dec!(8.00));
    }

    #[test]
    fn test_fixed_discount() {
        let c = coupon(DiscountKind::Fixed, dec!(15));
        assert_eq!(discount_for(&c, dec!(80.00)), dec!(15));
    }

    #[test]
    fn test_fixed_discount_clamped_to_total() {
        let c = coupon(DiscountKind::Fixed, dec!(100));
        assert_eq!(discount_for(&c, dec!(30.00)), dec!(30.00));
    }

    #[test]
    fn test_discount_on_zero_total() {
        let c = coupon(DiscountKind::Percentage, dec!(50));
        assert_eq!(discount_for(&c, Decimal::ZERO), Decimal::ZERO);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_coupon() -> impl Strategy<Value = Coupon> {
        (any::<bool>(), 1u32..=200, any::<bool>()).prop_map(|(is_percentage, value, active)| {
            Coupon {
                id: 1,
                code: "PROP".to_string(),
                kind: if is_percentage {
                    DiscountKind::Percentage
                } else {
                    DiscountKind::Fixed
                },
                value: Decimal::from(value),
                description: None,
                active,
                valid_from: None,
                valid_until: None,
            }
        })
    }

    /// The discount never exceeds the order total, whatever the coupon says
    #[test]
    fn prop_discount_never_exceeds_total() {
        proptest!(|(coupon in any_coupon(), total_cents in 0u64..10_000_00)| {
            let total = Decimal::from(total_cents) / Decimal::from(100);
            let discount = discount_for(&coupon, total);

            prop_assert!(discount <= total);
            prop_assert!(discount >= Decimal::ZERO);
        });
    }

    /// An inactive coupon never validates, regardless of window
    #[test]
    fn prop_inactive_never_valid() {
        proptest!(|(mut coupon in any_coupon())| {
            coupon.active = false;
            prop_assert!(!validate_at(&coupon, chrono::Utc::now()).is_valid());
        });
    }
}
