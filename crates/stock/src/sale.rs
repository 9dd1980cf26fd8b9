//! Demand side: sales and their items.
//!
//! The sale graph owns its items; stock assignments only point at them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{Entity, ObjectToken, RecordId};

use crate::keys::{AssignmentKey, SaleItemKey, SaleKey, SubjectKey};

/// Sale lifecycle, as far as stock accounting cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleState {
    New,
    Pending,
    Accepted,
    Completed,
    Canceled,
    Refunded,
}

impl SaleState {
    /// Whether stock is reserved for sales in this state.
    pub fn is_stockable(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted | Self::Completed)
    }
}

/// Root sale (order) of a sale item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    key: SaleKey,
    id: Option<RecordId>,
    state: SaleState,
    created_at: DateTime<Utc>,
    items: Vec<SaleItemKey>,
}

impl Sale {
    pub fn new(state: SaleState, created_at: DateTime<Utc>) -> Self {
        Self {
            key: SaleKey::new(),
            id: None,
            state,
            created_at,
            items: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn key(&self) -> SaleKey {
        self.key
    }

    pub fn state(&self) -> SaleState {
        self.state
    }

    pub fn set_state(&mut self, state: SaleState) {
        self.state = state;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn items(&self) -> &[SaleItemKey] {
        &self.items
    }

    pub(crate) fn push_item(&mut self, item: SaleItemKey) {
        self.items.push(item);
    }
}

impl Entity for Sale {
    fn token(&self) -> ObjectToken {
        self.key.token()
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }
}

/// A sale line that consumes stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleItem {
    key: SaleItemKey,
    id: Option<RecordId>,
    sale: SaleKey,
    subject: SubjectKey,
    quantity: Decimal,
    assignments: Vec<AssignmentKey>,
}

impl SaleItem {
    pub fn new(sale: SaleKey, subject: SubjectKey, quantity: Decimal) -> Self {
        Self {
            key: SaleItemKey::new(),
            id: None,
            sale,
            subject,
            quantity,
            assignments: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn key(&self) -> SaleItemKey {
        self.key
    }

    pub fn sale(&self) -> SaleKey {
        self.sale
    }

    pub fn subject(&self) -> SubjectKey {
        self.subject
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
    }

    pub fn assignments(&self) -> &[AssignmentKey] {
        &self.assignments
    }

    pub(crate) fn link_assignment(&mut self, assignment: AssignmentKey) {
        if !self.assignments.contains(&assignment) {
            self.assignments.push(assignment);
        }
    }

    pub(crate) fn unlink_assignment(&mut self, assignment: AssignmentKey) {
        self.assignments.retain(|a| *a != assignment);
    }
}

impl Entity for SaleItem {
    fn token(&self) -> ObjectToken {
        self.key.token()
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stockable_states() {
        assert!(SaleState::Pending.is_stockable());
        assert!(SaleState::Accepted.is_stockable());
        assert!(SaleState::Completed.is_stockable());
        assert!(!SaleState::New.is_stockable());
        assert!(!SaleState::Canceled.is_stockable());
        assert!(!SaleState::Refunded.is_stockable());
    }
}
