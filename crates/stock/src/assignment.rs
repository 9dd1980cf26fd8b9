//! Binding of reserved unit quantity to a sale item.

use rust_decimal::Decimal;

use stockflow_core::{Entity, ObjectToken, RecordId};

use crate::keys::{AssignmentKey, SaleItemKey, UnitKey};

/// A stock assignment.
///
/// `unit` and `item` are only `None` while the assignment is detached
/// (pending removal or reuse). Links are maintained by the
/// [`StockGraph`](crate::StockGraph).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAssignment {
    key: AssignmentKey,
    id: Option<RecordId>,
    unit: Option<UnitKey>,
    item: Option<SaleItemKey>,
    sold_quantity: Decimal,
    shipped_quantity: Decimal,
}

impl StockAssignment {
    /// A fresh, unbound, empty assignment.
    pub fn new() -> Self {
        Self {
            key: AssignmentKey::new(),
            id: None,
            unit: None,
            item: None,
            sold_quantity: Decimal::ZERO,
            shipped_quantity: Decimal::ZERO,
        }
    }

    /// Mark the assignment as loaded from storage.
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_sold_quantity(mut self, quantity: Decimal) -> Self {
        self.sold_quantity = quantity;
        self
    }

    pub fn with_shipped_quantity(mut self, quantity: Decimal) -> Self {
        self.shipped_quantity = quantity;
        self
    }

    pub fn key(&self) -> AssignmentKey {
        self.key
    }

    pub fn unit(&self) -> Option<UnitKey> {
        self.unit
    }

    pub(crate) fn set_unit(&mut self, unit: Option<UnitKey>) {
        self.unit = unit;
    }

    pub fn item(&self) -> Option<SaleItemKey> {
        self.item
    }

    pub(crate) fn set_item(&mut self, item: Option<SaleItemKey>) {
        self.item = item;
    }

    pub fn sold_quantity(&self) -> Decimal {
        self.sold_quantity
    }

    pub fn set_sold_quantity(&mut self, quantity: Decimal) {
        self.sold_quantity = quantity;
    }

    pub fn shipped_quantity(&self) -> Decimal {
        self.shipped_quantity
    }

    pub fn set_shipped_quantity(&mut self, quantity: Decimal) {
        self.shipped_quantity = quantity;
    }

    /// Sold quantity not shipped yet, hence movable.
    pub fn releasable_quantity(&self) -> Decimal {
        self.sold_quantity - self.shipped_quantity
    }

    pub fn is_empty(&self) -> bool {
        self.sold_quantity.is_zero()
    }

    pub fn is_detached(&self) -> bool {
        self.unit.is_none() && self.item.is_none()
    }
}

impl Default for StockAssignment {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for StockAssignment {
    fn token(&self) -> ObjectToken {
        self.key.token()
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }
}
