//! Quantity updates driven by deliveries, shipments, adjustments and sale
//! item changes.

use rust_decimal::Decimal;

use stockflow_core::{DomainError, DomainResult};

use crate::assignment_manager::StockAssignmentManager;
use crate::graph::StockGraph;
use crate::keys::{AssignmentKey, UnitKey};
use crate::persistence::TrackedField;
use crate::unit::StockUnit;
use crate::unit_manager::StockUnitManager;

#[derive(Debug, Clone, Copy)]
struct Quantities {
    ordered: Decimal,
    received: Decimal,
    shipped: Decimal,
    sold: Decimal,
    adjusted: Decimal,
}

impl Quantities {
    fn of(unit: &StockUnit) -> Self {
        Self {
            ordered: unit.ordered_quantity(),
            received: unit.received_quantity(),
            shipped: unit.shipped_quantity(),
            sold: unit.sold_quantity(),
            adjusted: unit.adjusted_quantity(),
        }
    }

    fn get(&self, field: TrackedField) -> Decimal {
        match field {
            TrackedField::OrderedQuantity => self.ordered,
            TrackedField::ReceivedQuantity => self.received,
            TrackedField::ShippedQuantity => self.shipped,
            TrackedField::SoldQuantity => self.sold,
            TrackedField::AdjustedQuantity => self.adjusted,
        }
    }

    fn with(mut self, field: TrackedField, value: Decimal) -> Self {
        match field {
            TrackedField::OrderedQuantity => self.ordered = value,
            TrackedField::ReceivedQuantity => self.received = value,
            TrackedField::ShippedQuantity => self.shipped = value,
            TrackedField::SoldQuantity => self.sold = value,
            TrackedField::AdjustedQuantity => self.adjusted = value,
        }
        self
    }

    fn check(&self, unit: UnitKey) -> DomainResult<()> {
        if self.sold > self.ordered + self.adjusted {
            return Err(DomainError::stock_logic(format!(
                "stock unit {unit}: sold quantity can't exceed ordered + adjusted quantity"
            )));
        }
        if self.shipped > self.received + self.adjusted {
            return Err(DomainError::stock_logic(format!(
                "stock unit {unit}: shipped quantity can't exceed received + adjusted quantity"
            )));
        }
        Ok(())
    }

    fn apply(&self, unit: &mut StockUnit) {
        unit.set_ordered_quantity(self.ordered);
        unit.set_received_quantity(self.received);
        unit.set_shipped_quantity(self.shipped);
        unit.set_sold_quantity(self.sold);
        unit.set_adjusted_quantity(self.adjusted);
    }
}

/// Applies quantity changes to stock units.
///
/// Every update takes either an absolute value or, with `relative`, a delta
/// added to the current value. The result must stay non-negative and keep
/// `sold <= ordered + adjusted` and `shipped <= received + adjusted`; the unit
/// is then persisted or removed.
#[derive(Debug, Clone)]
pub struct StockUnitUpdater {
    unit_manager: StockUnitManager,
}

impl StockUnitUpdater {
    pub fn new(unit_manager: StockUnitManager) -> Self {
        Self { unit_manager }
    }

    pub fn update_ordered(
        &self,
        graph: &mut StockGraph,
        unit: UnitKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<()> {
        self.update(graph, unit, TrackedField::OrderedQuantity, quantity, relative)
    }

    pub fn update_received(
        &self,
        graph: &mut StockGraph,
        unit: UnitKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<()> {
        self.update(graph, unit, TrackedField::ReceivedQuantity, quantity, relative)
    }

    pub fn update_shipped(
        &self,
        graph: &mut StockGraph,
        unit: UnitKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<()> {
        self.update(graph, unit, TrackedField::ShippedQuantity, quantity, relative)
    }

    pub fn update_sold(
        &self,
        graph: &mut StockGraph,
        unit: UnitKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<()> {
        self.update(graph, unit, TrackedField::SoldQuantity, quantity, relative)
    }

    pub fn update_adjusted(
        &self,
        graph: &mut StockGraph,
        unit: UnitKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<()> {
        self.update(graph, unit, TrackedField::AdjustedQuantity, quantity, relative)
    }

    fn update(
        &self,
        graph: &mut StockGraph,
        key: UnitKey,
        field: TrackedField,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<()> {
        let unit = graph.unit_mut(key)?;
        let current = Quantities::of(unit);

        let value = if relative {
            current.get(field) + quantity
        } else {
            quantity
        };
        if value < Decimal::ZERO {
            return Err(DomainError::stock_logic(format!(
                "stock unit {key}: {field:?} can't be negative"
            )));
        }

        let next = current.with(field, value);
        next.check(key)?;
        next.apply(unit);

        tracing::debug!(unit = %key, ?field, %value, "stock unit quantity updated");
        self.unit_manager.persist_or_remove(graph, key)
    }
}

/// Applies sold/shipped changes to assignments and propagates them to their unit.
#[derive(Debug, Clone)]
pub struct StockAssignmentUpdater {
    assignment_manager: StockAssignmentManager,
    unit_updater: StockUnitUpdater,
}

impl StockAssignmentUpdater {
    pub fn new(assignment_manager: StockAssignmentManager, unit_updater: StockUnitUpdater) -> Self {
        Self {
            assignment_manager,
            unit_updater,
        }
    }

    /// Change the sold quantity. Returns the delta actually applied.
    ///
    /// Increases are limited to the unit's reservable quantity; going below
    /// the shipped quantity is rejected.
    pub fn update_sold(
        &self,
        graph: &mut StockGraph,
        key: AssignmentKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<Decimal> {
        let (unit, current, shipped) = {
            let a = graph.assignment(key)?;
            (bound_unit(key, a.unit())?, a.sold_quantity(), a.shipped_quantity())
        };

        let target = if relative { current + quantity } else { quantity };
        if target < shipped {
            return Err(DomainError::stock_logic(format!(
                "stock assignment {key}: sold quantity can't be lower than shipped quantity"
            )));
        }

        let mut delta = target - current;
        if delta > Decimal::ZERO {
            let reservable = graph.unit(unit)?.reservable_quantity().max(Decimal::ZERO);
            if delta > reservable {
                tracing::warn!(assignment = %key, requested = %delta, %reservable, "sold increase limited by unit capacity");
                delta = reservable;
            }
        }
        if delta.is_zero() {
            return Ok(Decimal::ZERO);
        }

        graph
            .assignment_mut(key)?
            .set_sold_quantity(current + delta);
        self.assignment_manager.persist(graph, key)?;
        self.unit_updater.update_sold(graph, unit, delta, true)?;
        Ok(delta)
    }

    /// Change the shipped quantity. Returns the delta actually applied.
    ///
    /// The result can't exceed the sold quantity; increases are limited to the
    /// unit's shippable quantity.
    pub fn update_shipped(
        &self,
        graph: &mut StockGraph,
        key: AssignmentKey,
        quantity: Decimal,
        relative: bool,
    ) -> DomainResult<Decimal> {
        let (unit, sold, current) = {
            let a = graph.assignment(key)?;
            (bound_unit(key, a.unit())?, a.sold_quantity(), a.shipped_quantity())
        };

        let target = if relative { current + quantity } else { quantity };
        if target < Decimal::ZERO {
            return Err(DomainError::stock_logic(format!(
                "stock assignment {key}: shipped quantity can't be negative"
            )));
        }
        if target > sold {
            return Err(DomainError::stock_logic(format!(
                "stock assignment {key}: shipped quantity can't exceed sold quantity"
            )));
        }

        let mut delta = target - current;
        if delta > Decimal::ZERO {
            let shippable = graph.unit(unit)?.shippable_quantity().max(Decimal::ZERO);
            if delta > shippable {
                tracing::warn!(assignment = %key, requested = %delta, %shippable, "shipment limited by unit stock");
                delta = shippable;
            }
        }
        if delta.is_zero() {
            return Ok(Decimal::ZERO);
        }

        graph
            .assignment_mut(key)?
            .set_shipped_quantity(current + delta);
        self.assignment_manager.persist(graph, key)?;
        self.unit_updater.update_shipped(graph, unit, delta, true)?;
        Ok(delta)
    }
}

fn bound_unit(key: AssignmentKey, unit: Option<UnitKey>) -> DomainResult<UnitKey> {
    unit.ok_or_else(|| {
        DomainError::logic(format!("stock assignment {key} is not bound to a stock unit"))
    })
}
