//! Supply side: stock units.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{Entity, ObjectToken, RecordId};

use crate::keys::{AssignmentKey, SubjectKey, UnitKey};

/// Stock unit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockUnitState {
    /// Not ordered against any supply yet.
    New,
    /// Ordered, waiting for (more) deliveries.
    Pending,
    /// Received quantity is available for shipment.
    Ready,
    /// Terminal: ordered quantity fully shipped.
    Closed,
}

/// A trackable batch of supply for one subject.
///
/// Quantities are non-negative. The unit owns its assignments for lifecycle
/// purposes; the [`StockGraph`](crate::StockGraph) keeps `assignments` in sync
/// with each assignment's unit link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockUnit {
    key: UnitKey,
    id: Option<RecordId>,
    subject: Option<SubjectKey>,
    supplier_order_item: Option<RecordId>,
    ordered_quantity: Decimal,
    received_quantity: Decimal,
    shipped_quantity: Decimal,
    sold_quantity: Decimal,
    adjusted_quantity: Decimal,
    state: StockUnitState,
    closed_at: Option<DateTime<Utc>>,
    assignments: Vec<AssignmentKey>,
}

impl StockUnit {
    pub fn new(subject: SubjectKey) -> Self {
        Self {
            key: UnitKey::new(),
            id: None,
            subject: Some(subject),
            supplier_order_item: None,
            ordered_quantity: Decimal::ZERO,
            received_quantity: Decimal::ZERO,
            shipped_quantity: Decimal::ZERO,
            sold_quantity: Decimal::ZERO,
            adjusted_quantity: Decimal::ZERO,
            state: StockUnitState::New,
            closed_at: None,
            assignments: Vec::new(),
        }
    }

    /// Mark the unit as loaded from storage.
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Link the unit to the supplier order line it was created for.
    pub fn with_supplier_order_item(mut self, line: RecordId) -> Self {
        self.supplier_order_item = Some(line);
        self
    }

    pub fn with_ordered_quantity(mut self, quantity: Decimal) -> Self {
        self.ordered_quantity = quantity;
        self
    }

    pub fn with_received_quantity(mut self, quantity: Decimal) -> Self {
        self.received_quantity = quantity;
        self
    }

    pub fn with_shipped_quantity(mut self, quantity: Decimal) -> Self {
        self.shipped_quantity = quantity;
        self
    }

    pub fn with_adjusted_quantity(mut self, quantity: Decimal) -> Self {
        self.adjusted_quantity = quantity;
        self
    }

    pub fn key(&self) -> UnitKey {
        self.key
    }

    pub fn subject(&self) -> Option<SubjectKey> {
        self.subject
    }

    pub fn set_subject(&mut self, subject: Option<SubjectKey>) {
        self.subject = subject;
    }

    pub fn supplier_order_item(&self) -> Option<RecordId> {
        self.supplier_order_item
    }

    pub fn set_supplier_order_item(&mut self, line: Option<RecordId>) {
        self.supplier_order_item = line;
    }

    pub fn ordered_quantity(&self) -> Decimal {
        self.ordered_quantity
    }

    pub fn set_ordered_quantity(&mut self, quantity: Decimal) {
        self.ordered_quantity = quantity;
    }

    pub fn received_quantity(&self) -> Decimal {
        self.received_quantity
    }

    pub fn set_received_quantity(&mut self, quantity: Decimal) {
        self.received_quantity = quantity;
    }

    pub fn shipped_quantity(&self) -> Decimal {
        self.shipped_quantity
    }

    pub fn set_shipped_quantity(&mut self, quantity: Decimal) {
        self.shipped_quantity = quantity;
    }

    pub fn sold_quantity(&self) -> Decimal {
        self.sold_quantity
    }

    pub fn set_sold_quantity(&mut self, quantity: Decimal) {
        self.sold_quantity = quantity;
    }

    pub fn adjusted_quantity(&self) -> Decimal {
        self.adjusted_quantity
    }

    pub fn set_adjusted_quantity(&mut self, quantity: Decimal) {
        self.adjusted_quantity = quantity;
    }

    pub fn state(&self) -> StockUnitState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: StockUnitState) {
        self.state = state;
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub(crate) fn set_closed_at(&mut self, closed_at: Option<DateTime<Utc>>) {
        self.closed_at = closed_at;
    }

    pub fn assignments(&self) -> &[AssignmentKey] {
        &self.assignments
    }

    /// Capacity still available for new reservations.
    pub fn reservable_quantity(&self) -> Decimal {
        self.ordered_quantity + self.adjusted_quantity - self.sold_quantity
    }

    /// Physically available quantity not shipped yet.
    pub fn shippable_quantity(&self) -> Decimal {
        self.received_quantity + self.adjusted_quantity - self.shipped_quantity
    }

    /// An empty unit carries no quantity and no assignment; it is never persisted.
    pub fn is_empty(&self) -> bool {
        self.ordered_quantity.is_zero()
            && self.received_quantity.is_zero()
            && self.sold_quantity.is_zero()
            && self.adjusted_quantity.is_zero()
            && self.assignments.is_empty()
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

impl Entity for StockUnit {
    fn token(&self) -> ObjectToken {
        self.key.token()
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }
}
