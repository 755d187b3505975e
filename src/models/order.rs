use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enum representing the possible statuses of an order.
///
/// `Delivered` is terminal and `Cancelled` is absorbing: no operation in the
/// transition table leads out of either.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Submitted")]
    Submitted,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Operations that mutate an order after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum OrderOperation {
    AddItem,
    RemoveItem,
    UpdateItemQuantity,
    Submit,
    Approve,
    Ship,
    Deliver,
    Cancel,
}

/// One row of the lifecycle transition table.
#[derive(Debug)]
pub struct Transition {
    pub operation: OrderOperation,
    pub allowed_from: &'static [OrderStatus],
    /// `None` means the operation leaves the status unchanged.
    pub next: Option<OrderStatus>,
}

const ANY_STATUS: &[OrderStatus] = &[
    OrderStatus::Draft,
    OrderStatus::Submitted,
    OrderStatus::Approved,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

/// The full state machine as data: status x operation -> allowed / next
/// status. Every status check in the aggregate goes through this table.
///
/// RemoveItem and UpdateItemQuantity are deliberately allowed from every
/// status (admin-style correction); callers that want Draft-only semantics
/// gate them upstream.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        operation: OrderOperation::AddItem,
        allowed_from: &[OrderStatus::Draft],
        next: None,
    },
    Transition {
        operation: OrderOperation::RemoveItem,
        allowed_from: ANY_STATUS,
        next: None,
    },
    Transition {
        operation: OrderOperation::UpdateItemQuantity,
        allowed_from: ANY_STATUS,
        next: None,
    },
    Transition {
        operation: OrderOperation::Submit,
        allowed_from: &[OrderStatus::Draft],
        next: Some(OrderStatus::Submitted),
    },
    Transition {
        operation: OrderOperation::Approve,
        allowed_from: &[OrderStatus::Submitted],
        next: Some(OrderStatus::Approved),
    },
    Transition {
        operation: OrderOperation::Ship,
        allowed_from: &[OrderStatus::Approved],
        next: Some(OrderStatus::Shipped),
    },
    Transition {
        operation: OrderOperation::Deliver,
        allowed_from: &[OrderStatus::Shipped],
        next: Some(OrderStatus::Delivered),
    },
    Transition {
        operation: OrderOperation::Cancel,
        allowed_from: &[
            OrderStatus::Draft,
            OrderStatus::Submitted,
            OrderStatus::Approved,
        ],
        next: Some(OrderStatus::Cancelled),
    },
];

impl OrderStatus {
    /// Looks up the transition for `operation` from this status.
    ///
    /// Returns the status the order will be in after the operation, or
    /// `None` when the table forbids the operation from this status.
    pub fn apply(self, operation: OrderOperation) -> Option<OrderStatus> {
        let transition = TRANSITIONS
            .iter()
            .find(|t| t.operation == operation)
            .unwrap_or_else(|| unreachable!("transition table covers every operation"));

        if transition.allowed_from.contains(&self) {
            Some(transition.next.unwrap_or(self))
        } else {
            None
        }
    }

    pub fn permits(self, operation: OrderOperation) -> bool {
        self.apply(operation).is_some()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl OrderOperation {
    /// Message used when the transition table rejects this operation.
    pub fn denial_message(self) -> &'static str {
        match self {
            OrderOperation::AddItem => "Can only add items to draft orders",
            OrderOperation::Submit => "Only draft orders can be submitted",
            OrderOperation::Approve => "Only submitted orders can be approved",
            OrderOperation::Ship => "Only approved orders can be shipped",
            OrderOperation::Deliver => "Only shipped orders can be delivered",
            OrderOperation::Cancel => "Cannot cancel shipped or delivered orders",
            // Unguarded by status; only item-level checks can fail.
            OrderOperation::RemoveItem | OrderOperation::UpdateItemQuantity => {
                "Operation not permitted"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use OrderOperation::*;
    use OrderStatus::*;

    #[test]
    fn add_item_is_draft_only_and_keeps_status() {
        assert_eq!(Draft.apply(AddItem), Some(Draft));
        for status in [Submitted, Approved, Shipped, Delivered, Cancelled] {
            assert_eq!(status.apply(AddItem), None);
        }
    }

    #[test]
    fn submit_approve_ship_deliver_chain() {
        assert_eq!(Draft.apply(Submit), Some(Submitted));
        assert_eq!(Submitted.apply(Approve), Some(Approved));
        assert_eq!(Approved.apply(Ship), Some(Shipped));
        assert_eq!(Shipped.apply(Deliver), Some(Delivered));
    }

    #[test]
    fn submit_rejected_outside_draft() {
        for status in [Submitted, Approved, Shipped, Delivered, Cancelled] {
            assert!(!status.permits(Submit));
        }
    }

    #[test]
    fn cancel_allowed_until_shipped() {
        assert_eq!(Draft.apply(Cancel), Some(Cancelled));
        assert_eq!(Submitted.apply(Cancel), Some(Cancelled));
        assert_eq!(Approved.apply(Cancel), Some(Cancelled));
        assert!(!Shipped.permits(Cancel));
        assert!(!Delivered.permits(Cancel));
    }

    #[test]
    fn cancelled_is_absorbing() {
        for op in [AddItem, Submit, Approve, Ship, Deliver, Cancel] {
            assert!(!Cancelled.permits(op), "{op} should be rejected when cancelled");
        }
    }

    #[test]
    fn delivered_is_terminal() {
        for op in [AddItem, Submit, Approve, Ship, Deliver, Cancel] {
            assert!(!Delivered.permits(op), "{op} should be rejected when delivered");
        }
    }

    #[test]
    fn item_corrections_are_unguarded() {
        for status in [Draft, Submitted, Approved, Shipped, Delivered, Cancelled] {
            assert_eq!(status.apply(RemoveItem), Some(status));
            assert_eq!(status.apply(UpdateItemQuantity), Some(status));
        }
    }

    #[test]
    fn table_has_one_row_per_operation() {
        for op in [
            AddItem,
            RemoveItem,
            UpdateItemQuantity,
            Submit,
            Approve,
            Ship,
            Deliver,
            Cancel,
        ] {
            assert_eq!(
                TRANSITIONS.iter().filter(|t| t.operation == op).count(),
                1
            );
        }
    }
}
