use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::order_item_entity;

/// Flat tax rate applied to the discounted subtotal.
pub const TAX_RATE: Decimal = dec!(0.10);

/// Orders at or above this subtotal get the 10% discount.
pub const SUBTOTAL_DISCOUNT_THRESHOLD: Decimal = dec!(500.00);
pub const SUBTOTAL_DISCOUNT_RATE: Decimal = dec!(0.10);

/// Orders with at least this many units get the 5% discount.
pub const BULK_QUANTITY_THRESHOLD: i32 = 5;
pub const BULK_DISCOUNT_RATE: Decimal = dec!(0.05);

/// Orders below this total cannot be submitted.
pub const MINIMUM_ORDER_TOTAL: Decimal = dec!(10.00);

/// Which discount rule fired for an order. Rules are evaluated in priority
/// order and are never cumulative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountRule {
    /// Subtotal reached [`SUBTOTAL_DISCOUNT_THRESHOLD`].
    SubtotalThreshold,
    /// Total unit count reached [`BULK_QUANTITY_THRESHOLD`].
    BulkQuantity,
    None,
}

impl DiscountRule {
    pub fn reason(self) -> &'static str {
        match self {
            DiscountRule::SubtotalThreshold => "10% discount for orders over $500",
            DiscountRule::BulkQuantity => "5% discount for ordering 5+ items",
            DiscountRule::None => "No discount applied",
        }
    }
}

/// Derived monetary fields of an order, all rounded to two decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub discount_rule: DiscountRule,
}

/// Computes an order's derived monetary fields from its current item set.
///
/// Pure function of the items. Each derived field is rounded to two decimals
/// as it is produced and the next step works from the rounded value, so the
/// stored fields always satisfy `total == subtotal - discount + tax` exactly.
pub fn calculate(items: &[order_item_entity::Model]) -> OrderTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum();
    let subtotal = subtotal.round_dp(2);
    let total_quantity: i32 = items.iter().map(|item| item.quantity).sum();

    let (discount_rule, discount) = if subtotal >= SUBTOTAL_DISCOUNT_THRESHOLD {
        (DiscountRule::SubtotalThreshold, subtotal * SUBTOTAL_DISCOUNT_RATE)
    } else if total_quantity >= BULK_QUANTITY_THRESHOLD {
        (DiscountRule::BulkQuantity, subtotal * BULK_DISCOUNT_RATE)
    } else {
        (DiscountRule::None, Decimal::ZERO)
    };
    let discount = discount.round_dp(2);

    let tax = ((subtotal - discount) * TAX_RATE).round_dp(2);

    OrderTotals {
        subtotal,
        discount_amount: discount,
        tax_amount: tax,
        // sum of two-decimal values, already exact
        total_amount: subtotal - discount + tax,
        discount_rule,
    }
}

/// Line total for a single item.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    (unit_price * Decimal::from(quantity)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(unit_price: Decimal, quantity: i32) -> order_item_entity::Model {
        let now = Utc::now();
        order_item_entity::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Test Product".to_string(),
            unit_price,
            quantity,
            line_total: line_total(unit_price, quantity),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_order_has_zero_totals() {
        let totals = calculate(&[]);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, Decimal::ZERO);
        assert_eq!(totals.discount_rule, DiscountRule::None);
    }

    #[test]
    fn single_item_no_discount() {
        // one item @ $50 qty 1 -> subtotal 50, discount 0, tax 5, total 55
        let totals = calculate(&[item(dec!(50.00), 1)]);
        assert_eq!(totals.subtotal, dec!(50.00));
        assert_eq!(totals.discount_amount, dec!(0.00));
        assert_eq!(totals.tax_amount, dec!(5.00));
        assert_eq!(totals.total_amount, dec!(55.00));
        assert_eq!(totals.discount_rule, DiscountRule::None);
    }

    #[test]
    fn subtotal_threshold_discount() {
        // subtotal 600 -> discount 60, tax 54, total 594
        let totals = calculate(&[item(dec!(300.00), 2)]);
        assert_eq!(totals.subtotal, dec!(600.00));
        assert_eq!(totals.discount_amount, dec!(60.00));
        assert_eq!(totals.tax_amount, dec!(54.00));
        assert_eq!(totals.total_amount, dec!(594.00));
        assert_eq!(totals.discount_rule, DiscountRule::SubtotalThreshold);
    }

    #[test]
    fn bulk_quantity_discount() {
        // 5 items of qty 1 @ $10 -> subtotal 50, discount 2.50, tax 4.75, total 52.25
        let items: Vec<_> = (0..5).map(|_| item(dec!(10.00), 1)).collect();
        let totals = calculate(&items);
        assert_eq!(totals.subtotal, dec!(50.00));
        assert_eq!(totals.discount_amount, dec!(2.50));
        assert_eq!(totals.tax_amount, dec!(4.75));
        assert_eq!(totals.total_amount, dec!(52.25));
        assert_eq!(totals.discount_rule, DiscountRule::BulkQuantity);
    }

    #[test]
    fn subtotal_rule_wins_when_both_apply() {
        // 6 units and subtotal 600: only the 10% rule fires
        let totals = calculate(&[item(dec!(100.00), 6)]);
        assert_eq!(totals.discount_rule, DiscountRule::SubtotalThreshold);
        assert_eq!(totals.discount_amount, dec!(60.00));
    }

    #[test]
    fn exact_threshold_boundaries() {
        let totals = calculate(&[item(dec!(500.00), 1)]);
        assert_eq!(totals.discount_rule, DiscountRule::SubtotalThreshold);

        let totals = calculate(&[item(dec!(499.99), 1)]);
        assert_eq!(totals.discount_rule, DiscountRule::None);

        let totals = calculate(&[item(dec!(1.00), 5)]);
        assert_eq!(totals.discount_rule, DiscountRule::BulkQuantity);

        let totals = calculate(&[item(dec!(1.00), 4)]);
        assert_eq!(totals.discount_rule, DiscountRule::None);
    }

    #[test]
    fn totals_identity_holds() {
        let cases = [
            vec![item(dec!(19.99), 3)],
            vec![item(dec!(0.01), 1)],
            vec![item(dec!(123.45), 2), item(dec!(9.99), 7)],
            vec![item(dec!(250.00), 2), item(dec!(50.00), 1)],
            // discounts with a sub-cent component
            vec![item(dec!(500.15), 1)],
            vec![item(dec!(20.02), 5)],
        ];

        for items in cases {
            let totals = calculate(&items);
            assert_eq!(
                totals.total_amount,
                totals.subtotal - totals.discount_amount + totals.tax_amount
            );
            assert_eq!(
                totals.tax_amount,
                ((totals.subtotal - totals.discount_amount) * TAX_RATE).round_dp(2)
            );
        }
    }

    #[test]
    fn sub_cent_discount_rounds_before_tax() {
        // discount 50.015 rounds to 50.02; tax comes from the rounded value
        let totals = calculate(&[item(dec!(500.15), 1)]);
        assert_eq!(totals.subtotal, dec!(500.15));
        assert_eq!(totals.discount_amount, dec!(50.02));
        assert_eq!(totals.tax_amount, dec!(45.01));
        assert_eq!(totals.total_amount, dec!(495.14));
        assert_eq!(
            totals.total_amount,
            totals.subtotal - totals.discount_amount + totals.tax_amount
        );
    }
}
