use rust_decimal::Decimal;

/// Service for calculating order totals
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Calculate the subtotal for one order line
    ///
    /// # Arguments
    /// * `quantity` - Number of units ordered
    /// * `unit_price` - Price per unit at time of order
    pub fn line_subtotal(quantity: i32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    /// Sum of all line subtotals
    pub fn order_subtotal(subtotals: &[Decimal]) -> Decimal {
        subtotals.iter().sum()
    }

    /// Final order total: subtotal plus delivery fee minus discount
    ///
    /// Floors at zero; a generous coupon can make an order free but never
    /// produce a negative charge.
    pub fn order_total(
        subtotal: Decimal,
        delivery_fee: Option<Decimal>,
        discount: Decimal,
    ) -> Decimal {
        let gross = subtotal + delivery_fee.unwrap_or(Decimal::ZERO);
        (gross - discount).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_subtotal_basic() {
        assert_eq!(TotalsCalculator::line_subtotal(2, dec!(24.50)), dec!(49.00));
    }

    #[test]
    fn test_line_subtotal_single_unit() {
        assert_eq!(TotalsCalculator::line_subtotal(1, dec!(3.75)), dec!(3.75));
    }

    #[test]
    fn test_order_subtotal_multiple_lines() {
        let subtotals = vec![dec!(10.00), dec!(5.50), dec!(3.25)];
        assert_eq!(TotalsCalculator::order_subtotal(&subtotals), dec!(18.75));
    }

    #[test]
    fn test_order_subtotal_empty() {
        let subtotals: Vec<Decimal> = vec![];
        assert_eq!(TotalsCalculator::order_subtotal(&subtotals), dec!(0.00));
    }

    #[test]
    fn test_order_total_with_fee_and_discount() {
        let total = TotalsCalculator::order_total(dec!(50.00), Some(dec!(8.00)), dec!(10.00));
        assert_eq!(total, dec!(48.00));
    }

    #[test]
    fn test_order_total_without_fee() {
        let total = TotalsCalculator::order_total(dec!(50.00), None, dec!(0.00));
        assert_eq!(total, dec!(50.00));
    }

    #[test]
    fn test_order_total_floors_at_zero() {
        let total = TotalsCalculator::order_total(dec!(10.00), None, dec!(25.00));
        assert_eq!(total, dec!(0.00));
    }

    #[test]
    fn test_decimal_precision() {
        assert_eq!(TotalsCalculator::line_subtotal(3, dec!(4.33)), dec!(12.99));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Subtotal equals quantity times unit price for all valid inputs
    #[test]
    fn prop_line_subtotal_invariant() {
        proptest!(|(
            quantity in 1i32..=1000,
            price_cents in 1u32..=10000u32
        )| {
            let price = Decimal::from(price_cents) / Decimal::from(100);
            let subtotal = TotalsCalculator::line_subtotal(quantity, price);
            prop_assert_eq!(subtotal, Decimal::from(quantity) * price);
        });
    }

    /// Totals are never negative, whatever the discount
    #[test]
    fn prop_total_never_negative() {
        proptest!(|(
            subtotal_cents in 0u32..=100_000,
            fee_cents in proptest::option::of(0u32..=5_000),
            discount_cents in 0u32..=200_000
        )| {
            let subtotal = Decimal::from(subtotal_cents) / Decimal::from(100);
            let fee = fee_cents.map(|c| Decimal::from(c) / Decimal::from(100));
            let discount = Decimal::from(discount_cents) / Decimal::from(100);

            let total = TotalsCalculator::order_total(subtotal, fee, discount);
            prop_assert!(total >= Decimal::ZERO);
        });
    }

    /// Order of subtotals does not affect the sum
    #[test]
    fn prop_subtotal_sum_commutative() {
        proptest!(|(subtotals_cents in prop::collection::vec(1u32..=10000u32, 2..=10))| {
            let subtotals: Vec<Decimal> = subtotals_cents
                .iter()
                .map(|&cents| Decimal::from(cents) / Decimal::from(100))
                .collect();

            let total1 = TotalsCalculator::order_subtotal(&subtotals);

            let mut reversed = subtotals.clone();
            reversed.reverse();
            let total2 = TotalsCalculator::order_subtotal(&reversed);

            prop_assert_eq!(total1, total2);
        });
    }
}
