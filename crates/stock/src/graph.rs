//! In-memory object graph of a unit of work.
//!
//! Units, assignments, sales and sale items live in one arena keyed by their
//! typed keys. The graph is the only place that rewires relations, so both
//! sides of unit/assignment and item/assignment links always agree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use stockflow_core::{DomainError, DomainResult};

use crate::assignment::StockAssignment;
use crate::keys::{AssignmentKey, SaleItemKey, SaleKey, SubjectKey, UnitKey};
use crate::sale::{Sale, SaleItem};
use crate::unit::StockUnit;

#[derive(Debug, Default)]
pub struct StockGraph {
    units: HashMap<UnitKey, StockUnit>,
    assignments: HashMap<AssignmentKey, StockAssignment>,
    sales: HashMap<SaleKey, Sale>,
    items: HashMap<SaleItemKey, SaleItem>,
}

impl StockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- units ---

    pub fn insert_unit(&mut self, unit: StockUnit) -> UnitKey {
        let key = unit.key();
        self.units.insert(key, unit);
        key
    }

    pub fn unit(&self, key: UnitKey) -> DomainResult<&StockUnit> {
        self.units
            .get(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown stock unit {key}")))
    }

    pub fn unit_mut(&mut self, key: UnitKey) -> DomainResult<&mut StockUnit> {
        self.units
            .get_mut(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown stock unit {key}")))
    }

    pub fn units(&self) -> impl Iterator<Item = &StockUnit> {
        self.units.values()
    }

    // --- sales ---

    pub fn insert_sale(&mut self, sale: Sale) -> SaleKey {
        let key = sale.key();
        self.sales.insert(key, sale);
        key
    }

    pub fn sale(&self, key: SaleKey) -> DomainResult<&Sale> {
        self.sales
            .get(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown sale {key}")))
    }

    pub fn sale_mut(&mut self, key: SaleKey) -> DomainResult<&mut Sale> {
        self.sales
            .get_mut(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown sale {key}")))
    }

    /// Add an item to its (already inserted) sale.
    pub fn insert_item(&mut self, item: SaleItem) -> DomainResult<SaleItemKey> {
        let key = item.key();
        self.sale_mut(item.sale())?.push_item(key);
        self.items.insert(key, item);
        Ok(key)
    }

    pub fn item(&self, key: SaleItemKey) -> DomainResult<&SaleItem> {
        self.items
            .get(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown sale item {key}")))
    }

    pub fn item_mut(&mut self, key: SaleItemKey) -> DomainResult<&mut SaleItem> {
        self.items
            .get_mut(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown sale item {key}")))
    }

    // --- assignments ---

    /// Insert an unbound assignment.
    pub fn insert_assignment(&mut self, assignment: StockAssignment) -> AssignmentKey {
        let key = assignment.key();
        self.assignments.insert(key, assignment);
        key
    }

    /// Insert an assignment already bound to `unit` and `item` (hydration).
    ///
    /// Quantities are taken as they are; the unit's sold quantity is not touched.
    pub fn attach_assignment(
        &mut self,
        assignment: StockAssignment,
        unit: UnitKey,
        item: SaleItemKey,
    ) -> DomainResult<AssignmentKey> {
        let key = self.insert_assignment(assignment);
        self.set_assignment_unit(key, Some(unit))?;
        self.set_assignment_item(key, Some(item))?;
        Ok(key)
    }

    pub fn assignment(&self, key: AssignmentKey) -> DomainResult<&StockAssignment> {
        self.assignments
            .get(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown stock assignment {key}")))
    }

    pub fn assignment_mut(&mut self, key: AssignmentKey) -> DomainResult<&mut StockAssignment> {
        self.assignments
            .get_mut(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown stock assignment {key}")))
    }

    pub fn contains_assignment(&self, key: AssignmentKey) -> bool {
        self.assignments.contains_key(&key)
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Re-point an assignment to another unit (or to none).
    pub fn set_assignment_unit(
        &mut self,
        key: AssignmentKey,
        unit: Option<UnitKey>,
    ) -> DomainResult<()> {
        if let Some(next) = unit {
            self.unit(next)?;
        }

        let previous = self.assignment(key)?.unit();
        if previous == unit {
            return Ok(());
        }

        if let Some(previous) = previous.and_then(|p| self.units.get_mut(&p)) {
            previous.unlink_assignment(key);
        }
        if let Some(next) = unit {
            self.unit_mut(next)?.link_assignment(key);
        }
        self.assignment_mut(key)?.set_unit(unit);
        Ok(())
    }

    /// Re-point an assignment to another sale item (or to none).
    pub fn set_assignment_item(
        &mut self,
        key: AssignmentKey,
        item: Option<SaleItemKey>,
    ) -> DomainResult<()> {
        if let Some(next) = item {
            self.item(next)?;
        }

        let previous = self.assignment(key)?.item();
        if previous == item {
            return Ok(());
        }

        if let Some(previous) = previous.and_then(|p| self.items.get_mut(&p)) {
            previous.unlink_assignment(key);
        }
        if let Some(next) = item {
            self.item_mut(next)?.link_assignment(key);
        }
        self.assignment_mut(key)?.set_item(item);
        Ok(())
    }

    /// Unbind an assignment from both its unit and its item.
    pub fn detach_assignment(&mut self, key: AssignmentKey) -> DomainResult<()> {
        self.set_assignment_item(key, None)?;
        self.set_assignment_unit(key, None)
    }

    /// Detach and drop an assignment from the arena.
    pub fn discard_assignment(&mut self, key: AssignmentKey) -> DomainResult<StockAssignment> {
        self.detach_assignment(key)?;
        self.assignments
            .remove(&key)
            .ok_or_else(|| DomainError::logic(format!("unknown stock assignment {key}")))
    }

    /// The assignment of `unit` serving `item`, if any.
    pub fn find_assignment(
        &self,
        unit: UnitKey,
        item: SaleItemKey,
    ) -> DomainResult<Option<AssignmentKey>> {
        for key in self.unit(unit)?.assignments() {
            if self.assignment(*key)?.item() == Some(item) {
                return Ok(Some(*key));
            }
        }
        Ok(None)
    }

    /// Root sale of the item an assignment serves.
    pub fn sale_of_assignment(&self, key: AssignmentKey) -> DomainResult<&Sale> {
        let item = self
            .assignment(key)?
            .item()
            .ok_or_else(|| DomainError::logic(format!("stock assignment {key} has no sale item")))?;
        self.sale(self.item(item)?.sale())
    }

    pub fn sale_created_at(&self, key: AssignmentKey) -> DomainResult<DateTime<Utc>> {
        Ok(self.sale_of_assignment(key)?.created_at())
    }

    /// Subject of the unit an assignment is bound to.
    pub fn subject_of_assignment(&self, key: AssignmentKey) -> DomainResult<Option<SubjectKey>> {
        match self.assignment(key)?.unit() {
            Some(unit) => Ok(self.unit(unit)?.subject()),
            None => Ok(None),
        }
    }
}
