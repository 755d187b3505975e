use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::models::order::{OrderOperation, OrderStatus};
use crate::models::order_entity;
use crate::models::order_item_entity;
use crate::models::pricing::{self, DiscountRule};

/// Point-in-time copy of a product's catalog data.
///
/// Frozen into order lines at add-time; later catalog edits never reach
/// existing orders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
}

/// The order aggregate: header plus owned lines, one consistency boundary.
///
/// Every item-mutating operation ends with a full recalculation of the
/// derived monetary fields, so totals are never stale relative to the item
/// set. Status checks all route through the transition table in
/// [`crate::models::order`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderAggregate {
    pub order: order_entity::Model,
    pub items: Vec<order_item_entity::Model>,
}

impl OrderAggregate {
    /// Creates a new draft order with a freshly generated order number and
    /// zeroed totals.
    pub fn create() -> Self {
        let now = Utc::now();

        Self {
            order: order_entity::Model {
                id: Uuid::new_v4(),
                order_number: generate_order_number(),
                order_date: now,
                status: OrderStatus::Draft,
                subtotal: Decimal::ZERO,
                discount_amount: Decimal::ZERO,
                tax_amount: Decimal::ZERO,
                total_amount: Decimal::ZERO,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            items: Vec::new(),
        }
    }

    /// Reassembles an aggregate loaded from storage.
    pub fn from_parts(
        order: order_entity::Model,
        items: Vec<order_item_entity::Model>,
    ) -> Self {
        Self { order, items }
    }

    /// Adds `quantity` units of a product. If the product is already on the
    /// order the existing line is incremented; otherwise a new line is
    /// created from the snapshot. Either way the order totals are recomputed.
    pub fn add_item(
        &mut self,
        snapshot: &ProductSnapshot,
        quantity: i32,
    ) -> Result<(), DomainError> {
        self.guard(OrderOperation::AddItem)?;

        if quantity <= 0 {
            return Err(DomainError::new("Quantity must be greater than zero"));
        }

        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == snapshot.product_id)
        {
            Some(existing) => existing.add_quantity(quantity),
            None => self.items.push(order_item_entity::Model::new(
                self.order.id,
                snapshot.product_id,
                snapshot.name.clone(),
                snapshot.unit_price,
                quantity,
            )),
        }

        self.recalculate();
        Ok(())
    }

    /// Removes the line for `product_id`.
    ///
    /// Not status-gated (admin-style correction); business layers wanting
    /// Draft-only removal enforce that upstream.
    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), DomainError> {
        self.guard(OrderOperation::RemoveItem)?;

        let position = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| {
                DomainError::new(format!("Product {} not found in order", product_id))
            })?;

        self.items.remove(position);
        self.recalculate();
        Ok(())
    }

    /// Replaces the quantity of the line for `product_id` outright, then
    /// recomputes order totals. Like [`Self::remove_item`], not status-gated.
    pub fn update_item_quantity(
        &mut self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), DomainError> {
        self.guard(OrderOperation::UpdateItemQuantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| {
                DomainError::new(format!("Product {} not found in order", product_id))
            })?;

        item.update_quantity(quantity)?;
        self.recalculate();
        Ok(())
    }

    /// Submits a draft order for approval.
    pub fn submit(&mut self) -> Result<(), DomainError> {
        let next = self.guard(OrderOperation::Submit)?;

        if self.items.is_empty() {
            return Err(DomainError::new("Cannot submit an empty order"));
        }
        if self.order.total_amount < pricing::MINIMUM_ORDER_TOTAL {
            return Err(DomainError::new("Minimum order amount is $10"));
        }

        self.set_status(next);
        Ok(())
    }

    pub fn approve(&mut self) -> Result<(), DomainError> {
        let next = self.guard(OrderOperation::Approve)?;
        self.set_status(next);
        Ok(())
    }

    pub fn ship(&mut self) -> Result<(), DomainError> {
        let next = self.guard(OrderOperation::Ship)?;
        self.set_status(next);
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<(), DomainError> {
        let next = self.guard(OrderOperation::Deliver)?;
        self.set_status(next);
        Ok(())
    }

    /// Cancels the order, overwriting any prior notes with the reason.
    pub fn cancel(&mut self, reason: &str) -> Result<(), DomainError> {
        let next = self.guard(OrderOperation::Cancel)?;

        self.order.notes = Some(format!("Cancelled: {}", reason));
        self.set_status(next);
        Ok(())
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Which discount rule currently applies to this order.
    pub fn discount_rule(&self) -> DiscountRule {
        pricing::calculate(&self.items).discount_rule
    }

    fn guard(&self, operation: OrderOperation) -> Result<OrderStatus, DomainError> {
        self.order
            .status
            .apply(operation)
            .ok_or_else(|| DomainError::new(operation.denial_message()))
    }

    fn set_status(&mut self, status: OrderStatus) {
        self.order.status = status;
        self.order.updated_at = Utc::now();
    }

    fn recalculate(&mut self) {
        let totals = pricing::calculate(&self.items);
        self.order.subtotal = totals.subtotal;
        self.order.discount_amount = totals.discount_amount;
        self.order.tax_amount = totals.tax_amount;
        self.order.total_amount = totals.total_amount;
        self.order.updated_at = Utc::now();
    }
}

/// Generates an order number: `ORD-{UTC date}-{8 uppercase hex}`.
///
/// The suffix comes from a v4 UUID, so collisions are improbable but not
/// impossible; the unique column constraint is the hard guarantee.
pub fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let uuid = Uuid::new_v4().simple().to_string();
    format!("ORD-{}-{}", date, uuid[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(price: Decimal) -> ProductSnapshot {
        ProductSnapshot {
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            unit_price: price,
        }
    }

    fn order_with_total(price: Decimal) -> OrderAggregate {
        let mut order = OrderAggregate::create();
        order.add_item(&snapshot(price), 1).unwrap();
        order
    }

    #[test]
    fn create_starts_as_empty_draft() {
        let order = OrderAggregate::create();
        assert_eq!(order.order.status, OrderStatus::Draft);
        assert!(order.items.is_empty());
        assert_eq!(order.order.total_amount, Decimal::ZERO);
        assert!(order.order.order_number.starts_with("ORD-"));
    }

    #[test]
    fn adding_same_product_twice_merges_lines() {
        let mut order = OrderAggregate::create();
        let product = snapshot(dec!(10.00));

        order.add_item(&product, 2).unwrap();
        order.add_item(&product, 3).unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 5);
        assert_eq!(order.items[0].line_total, dec!(50.00));
        // 5 units trips the bulk discount
        assert_eq!(order.order.discount_amount, dec!(2.50));
        assert_eq!(order.order.total_amount, dec!(52.25));
    }

    #[test]
    fn add_item_rejects_non_positive_quantity() {
        let mut order = OrderAggregate::create();
        let err = order.add_item(&snapshot(dec!(10.00)), 0).unwrap_err();
        assert_eq!(err.message(), "Quantity must be greater than zero");
        assert!(order.items.is_empty());
    }

    #[test]
    fn add_item_rejected_outside_draft() {
        let mut order = order_with_total(dec!(50.00));
        order.submit().unwrap();

        let err = order.add_item(&snapshot(dec!(5.00)), 1).unwrap_err();
        assert_eq!(err.message(), "Can only add items to draft orders");
    }

    #[test]
    fn snapshot_price_is_frozen() {
        let mut order = OrderAggregate::create();
        let mut product = snapshot(dec!(10.00));
        order.add_item(&product, 1).unwrap();

        // catalog price changes after the line was created
        product.unit_price = dec!(99.00);
        order.add_item(&product, 1).unwrap();

        // the merged line keeps the price captured at first add
        assert_eq!(order.items[0].unit_price, dec!(10.00));
        assert_eq!(order.order.subtotal, dec!(20.00));
    }

    #[test]
    fn remove_item_recomputes_totals() {
        let mut order = OrderAggregate::create();
        let keep = snapshot(dec!(30.00));
        let drop = snapshot(dec!(20.00));
        order.add_item(&keep, 1).unwrap();
        order.add_item(&drop, 1).unwrap();
        assert_eq!(order.order.subtotal, dec!(50.00));

        order.remove_item(drop.product_id).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.order.subtotal, dec!(30.00));
        assert_eq!(order.order.total_amount, dec!(33.00));
    }

    #[test]
    fn remove_item_unknown_product_fails() {
        let mut order = order_with_total(dec!(50.00));
        let missing = Uuid::new_v4();
        let err = order.remove_item(missing).unwrap_err();
        assert_eq!(
            err.message(),
            format!("Product {} not found in order", missing)
        );
    }

    #[test]
    fn remove_item_is_not_status_gated() {
        let mut order = order_with_total(dec!(50.00));
        let product_id = order.items[0].product_id;
        order.submit().unwrap();
        order.approve().unwrap();

        // deliberately permitted outside Draft
        order.remove_item(product_id).unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.order.total_amount, Decimal::ZERO);
    }

    #[test]
    fn update_item_quantity_replaces_and_recomputes() {
        let mut order = OrderAggregate::create();
        let product = snapshot(dec!(10.00));
        order.add_item(&product, 2).unwrap();

        order.update_item_quantity(product.product_id, 6).unwrap();
        assert_eq!(order.items[0].quantity, 6);
        // 6 units -> bulk discount applies
        assert_eq!(order.order.subtotal, dec!(60.00));
        assert_eq!(order.order.discount_amount, dec!(3.00));
        assert_eq!(order.order.total_amount, dec!(62.70));
    }

    #[test]
    fn submit_requires_items() {
        let mut order = OrderAggregate::create();
        let err = order.submit().unwrap_err();
        assert_eq!(err.message(), "Cannot submit an empty order");
    }

    #[test]
    fn submit_enforces_minimum_total() {
        // unit price 9.08 -> tax 0.91, total 9.99
        let mut order = OrderAggregate::create();
        order.add_item(&snapshot(dec!(9.08)), 1).unwrap();
        assert_eq!(order.order.total_amount, dec!(9.99));

        let err = order.submit().unwrap_err();
        assert_eq!(err.message(), "Minimum order amount is $10");
        assert_eq!(order.order.status, OrderStatus::Draft);
    }

    #[test]
    fn submit_rejected_when_not_draft() {
        let mut order = order_with_total(dec!(50.00));
        order.submit().unwrap();
        let err = order.submit().unwrap_err();
        assert_eq!(err.message(), "Only draft orders can be submitted");
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut order = order_with_total(dec!(50.00));
        order.submit().unwrap();
        assert_eq!(order.order.status, OrderStatus::Submitted);
        order.approve().unwrap();
        assert_eq!(order.order.status, OrderStatus::Approved);
        order.ship().unwrap();
        assert_eq!(order.order.status, OrderStatus::Shipped);
        order.deliver().unwrap();
        assert_eq!(order.order.status, OrderStatus::Delivered);
    }

    #[test]
    fn approve_requires_submitted() {
        let mut order = order_with_total(dec!(50.00));
        let err = order.approve().unwrap_err();
        assert_eq!(err.message(), "Only submitted orders can be approved");
    }

    #[test]
    fn cancel_sets_notes_and_overwrites() {
        let mut order = order_with_total(dec!(50.00));
        order.order.notes = Some("gift wrap please".to_string());

        order.cancel("out of stock").unwrap();
        assert_eq!(order.order.status, OrderStatus::Cancelled);
        assert_eq!(order.order.notes.as_deref(), Some("Cancelled: out of stock"));
    }

    #[test]
    fn cancel_rejected_once_shipped() {
        let mut order = order_with_total(dec!(50.00));
        order.submit().unwrap();
        order.approve().unwrap();
        order.ship().unwrap();

        let err = order.cancel("changed my mind").unwrap_err();
        assert_eq!(err.message(), "Cannot cancel shipped or delivered orders");
        assert_eq!(order.order.status, OrderStatus::Shipped);
    }

    #[test]
    fn cancel_rejected_when_already_cancelled() {
        let mut order = order_with_total(dec!(50.00));
        order.cancel("first reason").unwrap();

        // Cancelled is absorbing; the notes keep the first reason
        assert!(order.cancel("second reason").is_err());
        assert_eq!(order.order.notes.as_deref(), Some("Cancelled: first reason"));
    }

    #[test]
    fn order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
