use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BagQuantityError {
    #[error("Bag quantity must be a whole number")]
    NotANumber,
    #[error("Bag quantity cannot be negative")]
    Negative,
}

impl From<BagQuantityError> for AppError {
    fn from(e: BagQuantityError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagQuantityDecision {
    Rejected(BagQuantityError),
    /// Same as the current value: go back without a request.
    Unchanged,
    Submit(u32),
}

/// Decides what a bag-quantity edit should do. The trimmed input must be a
/// plain integer.
#[must_use]
pub fn evaluate_bag_quantity(input: &str, current: u32) -> BagQuantityDecision {
    let parsed = match input.trim().parse::<i64>() {
        Ok(n) => n,
        Err(_) => return BagQuantityDecision::Rejected(BagQuantityError::NotANumber),
    };
    if parsed < 0 {
        return BagQuantityDecision::Rejected(BagQuantityError::Negative);
    }
    let Ok(quantity) = u32::try_from(parsed) else {
        return BagQuantityDecision::Rejected(BagQuantityError::NotANumber);
    };
    if quantity == current {
        BagQuantityDecision::Unchanged
    } else {
        BagQuantityDecision::Submit(quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    CreateOrder,
    CancelOrder,
    ClientDropoff,
    UpdateBagQuantity,
    CleanerDropOff,
    PickUpOrders,
}

impl MutationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateOrder => "create_order",
            Self::CancelOrder => "cancel_order",
            Self::ClientDropoff => "client_dropoff",
            Self::UpdateBagQuantity => "update_bag_quantity",
            Self::CleanerDropOff => "cleaner_drop_off",
            Self::PickUpOrders => "pick_up_orders",
        }
    }
}

/// A mutation that has been sent and not yet answered. `target` is the id
/// the mutation is keyed on (client, order or cleaner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingMutation {
    pub kind: MutationKind,
    pub target: String,
}

impl PendingMutation {
    pub fn new(kind: MutationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PendingMutations {
    in_flight: Vec<PendingMutation>,
}

impl PendingMutations {
    /// Records `mutation`. Returns false if the same one is already in flight.
    pub fn begin(&mut self, mutation: PendingMutation) -> bool {
        if self.in_flight.contains(&mutation) {
            return false;
        }
        self.in_flight.push(mutation);
        true
    }

    pub fn finish(&mut self, mutation: &PendingMutation) {
        self.in_flight.retain(|m| m != mutation);
    }

    #[must_use]
    pub fn is_pending(&self, kind: MutationKind, target: &str) -> bool {
        self.in_flight
            .iter()
            .any(|m| m.kind == kind && m.target == target)
    }

    #[must_use]
    pub fn is_targeting(&self, target: &str) -> bool {
        self.in_flight.iter().any(|m| m.target == target)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}
