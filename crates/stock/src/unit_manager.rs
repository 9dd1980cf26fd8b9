//! Persist-or-remove decisions for stock units.

use std::cell::RefCell;
use std::rc::Rc;

use rust_decimal::Decimal;

use stockflow_core::{DomainError, DomainResult, Entity};
use stockflow_events::UnitOfWork;

use crate::cache::StockUnitCache;
use crate::graph::StockGraph;
use crate::keys::UnitKey;
use crate::persistence::{EntityRef, PersistenceHelper, TrackedField};
use crate::state::StockUnitStateResolver;
use crate::unit::StockUnit;

#[derive(Clone)]
pub struct StockUnitManager {
    persistence: Rc<dyn PersistenceHelper>,
    resolver: StockUnitStateResolver,
    cache: Rc<RefCell<StockUnitCache>>,
}

impl StockUnitManager {
    pub fn new(
        persistence: Rc<dyn PersistenceHelper>,
        resolver: StockUnitStateResolver,
        cache: Rc<RefCell<StockUnitCache>>,
    ) -> Self {
        Self {
            persistence,
            resolver,
            cache,
        }
    }

    pub fn cache(&self) -> &RefCell<StockUnitCache> {
        &self.cache
    }

    /// Resolve the unit's state, then persist it, or delete it if it is empty.
    ///
    /// Removal is idempotent within a unit of work: a unit already marked
    /// removed in the cache is not scheduled for deletion again.
    pub fn persist_or_remove(&self, graph: &mut StockGraph, key: UnitKey) -> DomainResult<()> {
        let unit = graph.unit_mut(key)?;
        if unit.subject().is_none() {
            return Err(DomainError::logic(format!("stock unit {key} has no subject")));
        }

        self.resolver.resolve(unit);
        let unit: &StockUnit = unit;

        if unit.is_empty() {
            if self.cache.borrow().is_removed(unit) {
                tracing::debug!(unit = %key, "stock unit already scheduled for removal");
                return Ok(());
            }

            self.ensure_deletable(unit)?;
            self.cache.borrow_mut().remove(unit)?;
            // Never committed in a state worth notifying about.
            self.persistence.remove(EntityRef::Unit(unit), false);
            tracing::info!(unit = %key, "empty stock unit removed");
            return Ok(());
        }

        self.cache.borrow_mut().add(unit)?;
        self.persistence
            .persist_and_recompute(EntityRef::Unit(unit), true);
        Ok(())
    }

    /// Refuse to delete a unit that has been delivered or shipped.
    fn ensure_deletable(&self, unit: &StockUnit) -> DomainResult<()> {
        if !unit.is_persisted() {
            return Ok(());
        }

        let entity = EntityRef::Unit(unit);
        for field in [TrackedField::ReceivedQuantity, TrackedField::ShippedQuantity] {
            if !self.persistence.is_changed(entity, field) {
                continue;
            }
            let was_moved = self
                .persistence
                .change_set(entity, field)
                .is_some_and(|change| change.old > Decimal::ZERO);
            if was_moved {
                return Err(DomainError::illegal_operation(format!(
                    "stock unit {} has been delivered or shipped and can't be deleted",
                    unit.key()
                )));
            }
        }
        Ok(())
    }

    /// Clear the unit cache whenever the unit of work closes.
    pub fn subscribe(&self, uow: &mut UnitOfWork<StockGraph>) {
        let cache = Rc::clone(&self.cache);
        uow.on_close(move |_| {
            cache.borrow_mut().clear();
            Ok(())
        });
    }
}

impl core::fmt::Debug for StockUnitManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockUnitManager")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;
    use crate::in_memory::Target;
    use crate::unit::StockUnitState;
    use rust_decimal_macros::dec;

    #[test]
    fn non_empty_unit_is_persisted_and_cached() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(10));

        fx.engine
            .unit_manager()
            .persist_or_remove(&mut fx.graph, unit)
            .unwrap();

        assert_eq!(fx.graph.unit(unit).unwrap().state(), StockUnitState::Pending);
        assert_eq!(fx.persistence.persist_count(Target::Unit(unit)), 1);
        assert_eq!(fx.persistence.events().len(), 1);
        assert!(fx.engine.unit_cache().borrow().is_added(fx.graph.unit(unit).unwrap()));
    }

    #[test]
    fn empty_unit_is_removed_whatever_its_state() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(10));
        let manager = fx.engine.unit_manager().clone();
        manager.persist_or_remove(&mut fx.graph, unit).unwrap();

        fx.graph
            .unit_mut(unit)
            .unwrap()
            .set_ordered_quantity(Decimal::ZERO);
        manager.persist_or_remove(&mut fx.graph, unit).unwrap();
        manager.persist_or_remove(&mut fx.graph, unit).unwrap();

        assert_eq!(fx.persistence.removed(), vec![Target::Unit(unit)]);
        let cache = fx.engine.unit_cache().borrow();
        assert!(cache.is_removed(fx.graph.unit(unit).unwrap()));
        assert!(cache.find_by_subject(fx.subject).is_empty());
    }

    #[test]
    fn delivered_unit_cannot_be_deleted() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(10));
        fx.graph
            .unit_mut(unit)
            .unwrap()
            .set_received_quantity(dec!(2));
        fx.track_unit(unit);

        let u = fx.graph.unit_mut(unit).unwrap();
        u.set_ordered_quantity(Decimal::ZERO);
        u.set_received_quantity(Decimal::ZERO);

        let err = fx
            .engine
            .unit_manager()
            .persist_or_remove(&mut fx.graph, unit)
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalOperation(_)));
        assert!(fx.persistence.removed().is_empty());
    }

    #[test]
    fn unit_without_subject_is_a_logic_error() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(1));
        fx.graph.unit_mut(unit).unwrap().set_subject(None);

        let err = fx
            .engine
            .unit_manager()
            .persist_or_remove(&mut fx.graph, unit)
            .unwrap_err();
        assert!(matches!(err, DomainError::Logic(_)));
    }

    #[test]
    fn closing_the_unit_of_work_clears_the_cache() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(4));
        let mut uow = UnitOfWork::new();
        fx.engine.subscribe(&mut uow);

        fx.engine
            .unit_manager()
            .persist_or_remove(&mut fx.graph, unit)
            .unwrap();
        uow.close(&mut fx.graph).unwrap();

        assert!(fx.engine.unit_cache().borrow().find_by_subject(fx.subject).is_empty());
    }
}
