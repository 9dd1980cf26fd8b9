//! Narrow interfaces to the persistence layer.
//!
//! The engine never talks to storage directly: it schedules operations
//! through a [`PersistenceHelper`] and allocates rows through a
//! [`StockFactory`]. Both are object-safe so managers can hold them behind
//! `Rc<dyn ...>`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainResult, Entity, ObjectToken};

use crate::assignment::StockAssignment;
use crate::graph::StockGraph;
use crate::keys::{AssignmentKey, SaleItemKey};
use crate::unit::StockUnit;

/// An entity handed to the persistence layer.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Unit(&'a StockUnit),
    Assignment(&'a StockAssignment),
}

impl EntityRef<'_> {
    pub fn token(&self) -> ObjectToken {
        match self {
            EntityRef::Unit(u) => u.token(),
            EntityRef::Assignment(a) => a.token(),
        }
    }

    /// Current value of a tracked field, `None` if the entity has no such field.
    pub fn field(&self, field: TrackedField) -> Option<Decimal> {
        match (self, field) {
            (EntityRef::Unit(u), TrackedField::OrderedQuantity) => Some(u.ordered_quantity()),
            (EntityRef::Unit(u), TrackedField::ReceivedQuantity) => Some(u.received_quantity()),
            (EntityRef::Unit(u), TrackedField::ShippedQuantity) => Some(u.shipped_quantity()),
            (EntityRef::Unit(u), TrackedField::SoldQuantity) => Some(u.sold_quantity()),
            (EntityRef::Unit(u), TrackedField::AdjustedQuantity) => Some(u.adjusted_quantity()),
            (EntityRef::Assignment(a), TrackedField::SoldQuantity) => Some(a.sold_quantity()),
            (EntityRef::Assignment(a), TrackedField::ShippedQuantity) => {
                Some(a.shipped_quantity())
            }
            (EntityRef::Assignment(_), _) => None,
        }
    }
}

/// Quantity columns whose changes the persistence layer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    OrderedQuantity,
    ReceivedQuantity,
    ShippedQuantity,
    SoldQuantity,
    AdjustedQuantity,
}

impl TrackedField {
    pub const ALL: [TrackedField; 5] = [
        TrackedField::OrderedQuantity,
        TrackedField::ReceivedQuantity,
        TrackedField::ShippedQuantity,
        TrackedField::SoldQuantity,
        TrackedField::AdjustedQuantity,
    ];
}

/// Stored vs. in-memory value of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub old: Decimal,
    pub new: Decimal,
}

/// Persistence helper (scheduling only; flushing is the caller's business).
pub trait PersistenceHelper {
    /// Schedule an insert/update.
    fn persist(&self, entity: EntityRef<'_>);

    /// Schedule an insert/update and the recomputation of dependents
    /// (optionally through a scheduled event).
    fn persist_and_recompute(&self, entity: EntityRef<'_>, schedule_event: bool);

    /// Schedule a delete.
    fn remove(&self, entity: EntityRef<'_>, schedule_event: bool);

    /// Whether `field` differs from its stored value.
    fn is_changed(&self, entity: EntityRef<'_>, field: TrackedField) -> bool;

    /// Stored and current value of `field`, if it changed.
    fn change_set(&self, entity: EntityRef<'_>, field: TrackedField) -> Option<ChangeSet>;
}

/// Allocates new stock assignments.
pub trait StockFactory {
    /// A fresh, empty, unbound assignment inserted in `graph` for `item`.
    ///
    /// Binding the item is left to the caller.
    fn create_stock_assignment_for_item(
        &self,
        graph: &mut StockGraph,
        item: SaleItemKey,
    ) -> DomainResult<AssignmentKey>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStockFactory;

impl StockFactory for DefaultStockFactory {
    fn create_stock_assignment_for_item(
        &self,
        graph: &mut StockGraph,
        item: SaleItemKey,
    ) -> DomainResult<AssignmentKey> {
        graph.item(item)?;
        Ok(graph.insert_assignment(StockAssignment::new()))
    }
}
