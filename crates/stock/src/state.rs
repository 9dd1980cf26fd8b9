//! Stock unit state resolution (quantities -> lifecycle state).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::unit::{StockUnit, StockUnitState};

/// Resolves a unit's lifecycle state from its quantities.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockUnitStateResolver;

impl StockUnitStateResolver {
    pub fn new() -> Self {
        Self
    }

    /// State the unit's quantities call for. Pure.
    ///
    /// - `Pending` once ordered against a supplier order line.
    /// - `Closed` once the (non-zero) ordered quantity is fully shipped.
    /// - Otherwise, with something received: `Pending` if everything received
    ///   has been shipped already, `Ready` if not.
    ///
    /// Over-delivery (`received > ordered`) is not special-cased: shipping the
    /// ordered quantity closes the unit.
    pub fn state_for(&self, unit: &StockUnit) -> StockUnitState {
        let mut state = StockUnitState::New;

        if unit.ordered_quantity() > Decimal::ZERO && unit.supplier_order_item().is_some() {
            state = StockUnitState::Pending;
        }

        if !unit.ordered_quantity().is_zero() && unit.ordered_quantity() == unit.shipped_quantity()
        {
            return StockUnitState::Closed;
        }

        if unit.received_quantity() > Decimal::ZERO {
            state = if unit.received_quantity() == unit.shipped_quantity() {
                StockUnitState::Pending
            } else {
                StockUnitState::Ready
            };
        }

        state
    }

    /// Resolve and apply the state. Returns whether it changed.
    pub fn resolve(&self, unit: &mut StockUnit) -> bool {
        self.resolve_at(unit, Utc::now())
    }

    /// Same as [`resolve`](Self::resolve) with an explicit clock.
    pub fn resolve_at(&self, unit: &mut StockUnit, now: DateTime<Utc>) -> bool {
        let state = self.state_for(unit);

        if state == StockUnitState::Closed {
            if unit.closed_at().is_none() {
                unit.set_closed_at(Some(now));
            }
        } else {
            unit.set_closed_at(None);
        }

        if unit.state() == state {
            return false;
        }

        tracing::debug!(unit = %unit.key(), from = ?unit.state(), to = ?state, "stock unit state changed");
        unit.set_state(state);
        true
    }
}
