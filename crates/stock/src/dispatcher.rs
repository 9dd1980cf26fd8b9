//! Moving reserved quantity between stock units.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, DomainResult};

use crate::assignment_manager::StockAssignmentManager;
use crate::graph::StockGraph;
use crate::keys::{AssignmentKey, UnitKey};
use crate::unit_manager::StockUnitManager;

/// Which demand is served first, by sale creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest sales first.
    #[default]
    Asc,
    /// Newest sales first.
    Desc,
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(DomainError::validation(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// Reallocates reserved quantity from one unit to another.
///
/// Total sold quantity per sale item is conserved, shipped quantity never
/// moves, and the target never ends up sold beyond `ordered + adjusted`.
#[derive(Debug, Clone)]
pub struct StockAssignmentDispatcher {
    assignment_manager: StockAssignmentManager,
    unit_manager: StockUnitManager,
    default_direction: SortDirection,
}

impl StockAssignmentDispatcher {
    pub fn new(
        assignment_manager: StockAssignmentManager,
        unit_manager: StockUnitManager,
        default_direction: SortDirection,
    ) -> Self {
        Self {
            assignment_manager,
            unit_manager,
            default_direction,
        }
    }

    pub fn default_direction(&self) -> SortDirection {
        self.default_direction
    }

    /// [`move_assignments`](Self::move_assignments) in the configured direction.
    pub fn move_assignments_default(
        &self,
        graph: &mut StockGraph,
        source: UnitKey,
        target: UnitKey,
        quantity: Decimal,
    ) -> DomainResult<Decimal> {
        self.move_assignments(graph, source, target, quantity, self.default_direction)
    }

    /// Move up to `quantity` of `source`'s reservations to `target`.
    ///
    /// Returns the quantity actually moved, which is less than requested when
    /// the target's reservable quantity or the source's releasable quantity
    /// runs short. Both units are persisted (or removed) afterwards.
    pub fn move_assignments(
        &self,
        graph: &mut StockGraph,
        source: UnitKey,
        target: UnitKey,
        quantity: Decimal,
        direction: SortDirection,
    ) -> DomainResult<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::stock_logic("quantity must be greater than zero"));
        }
        if source == target {
            return Err(DomainError::stock_logic(
                "source and target stock units must be different",
            ));
        }

        let source_subject = graph
            .unit(source)?
            .subject()
            .ok_or_else(|| DomainError::logic(format!("stock unit {source} has no subject")))?;
        let target_unit = graph.unit(target)?;
        let target_subject = target_unit
            .subject()
            .ok_or_else(|| DomainError::logic(format!("stock unit {target} has no subject")))?;
        if source_subject != target_subject {
            return Err(DomainError::stock_logic(
                "source and target stock units must share the same subject",
            ));
        }

        let reservable = target_unit.reservable_quantity();
        if reservable <= Decimal::ZERO {
            tracing::warn!(%source, %target, "target stock unit has no reservable quantity");
            return Ok(Decimal::ZERO);
        }
        let mut quantity = quantity;
        if quantity > reservable {
            tracing::warn!(%source, %target, requested = %quantity, %reservable, "move limited by target capacity");
            quantity = reservable;
        }

        let assignments = self.sorted_assignments(graph, source, direction)?;

        let mut moved = Decimal::ZERO;
        for assignment in assignments {
            if quantity <= Decimal::ZERO {
                break;
            }
            let delta = self.move_assignment(graph, assignment, target, quantity)?;
            moved += delta;
            quantity -= delta;
        }

        self.unit_manager.persist_or_remove(graph, source)?;
        self.unit_manager.persist_or_remove(graph, target)?;

        tracing::info!(%source, %target, %moved, ?direction, "stock assignments moved");
        Ok(moved)
    }

    /// Move up to `quantity` of one assignment's releasable quantity to `target`.
    ///
    /// Units are not persisted here; see [`move_assignments`](Self::move_assignments).
    pub fn move_assignment(
        &self,
        graph: &mut StockGraph,
        key: AssignmentKey,
        target: UnitKey,
        quantity: Decimal,
    ) -> DomainResult<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::stock_logic("quantity must be greater than zero"));
        }

        let assignment = graph.assignment(key)?;
        let source = assignment.unit().ok_or_else(|| {
            DomainError::logic(format!("stock assignment {key} is not bound to a stock unit"))
        })?;
        let item = assignment.item().ok_or_else(|| {
            DomainError::logic(format!("stock assignment {key} is not bound to a sale item"))
        })?;
        if source == target {
            return Err(DomainError::stock_logic(
                "source and target stock units must be different",
            ));
        }
        graph.unit(target)?;

        // Shipped quantity is locked to its unit.
        let quantity = quantity.min(assignment.releasable_quantity());
        if quantity <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let full_move = quantity == assignment.sold_quantity();

        let source_unit = graph.unit_mut(source)?;
        source_unit.set_sold_quantity(source_unit.sold_quantity() - quantity);
        let target_unit = graph.unit_mut(target)?;
        target_unit.set_sold_quantity(target_unit.sold_quantity() + quantity);

        let merge = graph.find_assignment(target, item)?;

        match (full_move, merge) {
            (true, Some(merge)) => {
                credit(graph, merge, quantity)?;
                graph.assignment_mut(key)?.set_sold_quantity(Decimal::ZERO);
                self.assignment_manager.remove(graph, key, true)?;
                self.assignment_manager.persist(graph, merge)?;
            }
            (true, None) => {
                graph.set_assignment_unit(key, Some(target))?;
                self.assignment_manager.persist(graph, key)?;
            }
            (false, merge) => {
                credit(graph, key, -quantity)?;
                self.assignment_manager.persist(graph, key)?;

                let merge = match merge {
                    Some(merge) => merge,
                    None => self.assignment_manager.create(graph, item, Some(target))?,
                };
                credit(graph, merge, quantity)?;
                self.assignment_manager.persist(graph, merge)?;
            }
        }

        tracing::debug!(assignment = %key, %source, %target, %quantity, full_move, "stock assignment moved");
        Ok(quantity)
    }

    fn sorted_assignments(
        &self,
        graph: &StockGraph,
        unit: UnitKey,
        direction: SortDirection,
    ) -> DomainResult<Vec<AssignmentKey>> {
        let mut dated = graph
            .unit(unit)?
            .assignments()
            .iter()
            .map(|key| Ok((*key, graph.sale_created_at(*key)?)))
            .collect::<DomainResult<Vec<_>>>()?;

        // `sort_by` is stable: equal dates keep the unit's order.
        match direction {
            SortDirection::Asc => dated.sort_by(|a, b| a.1.cmp(&b.1)),
            SortDirection::Desc => dated.sort_by(|a, b| b.1.cmp(&a.1)),
        }

        Ok(dated.into_iter().map(|(key, _)| key).collect())
    }
}

fn credit(graph: &mut StockGraph, key: AssignmentKey, quantity: Decimal) -> DomainResult<()> {
    let assignment = graph.assignment_mut(key)?;
    assignment.set_sold_quantity(assignment.sold_quantity() + quantity);
    Ok(())
}
