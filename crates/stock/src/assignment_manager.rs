//! Creation, persistence and safety-checked removal of stock assignments.

use std::cell::RefCell;
use std::rc::Rc;

use stockflow_core::{DomainError, DomainResult, Entity};
use stockflow_events::UnitOfWork;

use crate::cache::StockAssignmentCache;
use crate::graph::StockGraph;
use crate::keys::{AssignmentKey, SaleItemKey, UnitKey};
use crate::persistence::{EntityRef, PersistenceHelper, StockFactory};

#[derive(Clone)]
pub struct StockAssignmentManager {
    persistence: Rc<dyn PersistenceHelper>,
    factory: Rc<dyn StockFactory>,
    cache: Rc<RefCell<StockAssignmentCache>>,
}

impl StockAssignmentManager {
    pub fn new(
        persistence: Rc<dyn PersistenceHelper>,
        factory: Rc<dyn StockFactory>,
        cache: Rc<RefCell<StockAssignmentCache>>,
    ) -> Self {
        Self {
            persistence,
            factory,
            cache,
        }
    }

    pub fn cache(&self) -> &RefCell<StockAssignmentCache> {
        &self.cache
    }

    /// Create an assignment serving `item`, optionally bound to `unit`.
    ///
    /// When bound, an assignment removed earlier in this unit of work for the
    /// same `(unit, item)` pair is reused instead of allocating a new row. The
    /// result is always empty.
    pub fn create(
        &self,
        graph: &mut StockGraph,
        item: SaleItemKey,
        unit: Option<UnitKey>,
    ) -> DomainResult<AssignmentKey> {
        graph.item(item)?;

        let recycled = match unit {
            Some(unit) => self.cache.borrow().find_removed(graph.unit(unit)?, item),
            None => None,
        };

        let key = match recycled {
            Some(key) => {
                tracing::debug!(assignment = %key, %item, "reusing removed stock assignment");
                key
            }
            None => self.factory.create_stock_assignment_for_item(graph, item)?,
        };

        graph.set_assignment_item(key, Some(item))?;
        if let Some(unit) = unit {
            graph.set_assignment_unit(key, Some(unit))?;
            if let Some(subject) = graph.unit(unit)?.subject() {
                self.cache.borrow_mut().add(subject, graph.assignment(key)?);
            }
        }

        Ok(key)
    }

    /// Persist a non-empty assignment; an empty one goes through [`remove`](Self::remove).
    ///
    /// Recomputation is driven by the unit, not requested here.
    pub fn persist(&self, graph: &mut StockGraph, key: AssignmentKey) -> DomainResult<()> {
        if graph.assignment(key)?.is_empty() {
            return self.remove(graph, key, false);
        }

        let assignment = graph.assignment(key)?;
        self.persistence.persist(EntityRef::Assignment(assignment));
        if let Some(subject) = graph.subject_of_assignment(key)? {
            self.cache.borrow_mut().add(subject, assignment);
        }
        Ok(())
    }

    /// Remove an empty assignment.
    ///
    /// Unless `hard`:
    /// - when removal is prevented (see [`is_removal_prevented`](Self::is_removal_prevented))
    ///   the zero-quantity assignment is persisted as a placeholder instead;
    /// - a persisted assignment is detached and kept in the removal cache, to be
    ///   reused by [`create`](Self::create) or deleted when the unit of work closes.
    ///
    /// Anything else is deleted outright.
    pub fn remove(&self, graph: &mut StockGraph, key: AssignmentKey, hard: bool) -> DomainResult<()> {
        let assignment = graph.assignment(key)?;
        if !assignment.is_empty() {
            return Err(DomainError::logic(format!(
                "stock assignment {key} must be empty to be removed"
            )));
        }

        if !hard {
            if self.cache.borrow().is_removed(assignment) {
                return Ok(());
            }

            if self.is_removal_prevented(graph, key)? {
                tracing::debug!(assignment = %key, "removal prevented, keeping empty stock assignment");
                self.persistence.persist(EntityRef::Assignment(graph.assignment(key)?));
                return Ok(());
            }

            let subject = graph.subject_of_assignment(key)?;
            if let (true, Some(subject)) = (graph.assignment(key)?.is_persisted(), subject) {
                self.cache.borrow_mut().remove(subject, graph.assignment(key)?);
                graph.detach_assignment(key)?;
                tracing::debug!(assignment = %key, "stock assignment detached for reuse");
                return Ok(());
            }
        }

        self.delete(graph, key)
    }

    /// Whether removing this assignment would leave its sale item without any
    /// allocation while its sale still reserves stock.
    pub fn is_removal_prevented(&self, graph: &StockGraph, key: AssignmentKey) -> DomainResult<bool> {
        let Some(item) = graph.assignment(key)?.item() else {
            return Ok(false);
        };
        let item = graph.item(item)?;
        let sale = graph.sale(item.sale())?;

        Ok(sale.state().is_stockable() && item.assignments().iter().all(|a| *a == key))
    }

    /// Hard-delete every assignment still pending removal. Draining resets
    /// the cache.
    pub fn flush(&self, graph: &mut StockGraph) -> DomainResult<()> {
        let pending = self.cache.borrow_mut().drain_removed();

        let mut deleted = 0usize;
        for key in pending {
            if !graph.contains_assignment(key) || !graph.assignment(key)?.is_detached() {
                continue;
            }
            self.delete(graph, key)?;
            deleted += 1;
        }

        if deleted > 0 {
            tracing::info!(deleted, "flushed removed stock assignments");
        }
        Ok(())
    }

    /// Flush the removal cache whenever the unit of work closes.
    pub fn subscribe(&self, uow: &mut UnitOfWork<StockGraph>) {
        let manager = self.clone();
        uow.on_close(move |graph| manager.flush(graph));
    }

    fn delete(&self, graph: &mut StockGraph, key: AssignmentKey) -> DomainResult<()> {
        let assignment = graph.discard_assignment(key)?;
        self.cache.borrow_mut().forget(&assignment);
        self.persistence
            .remove(EntityRef::Assignment(&assignment), false);
        tracing::debug!(assignment = %key, "stock assignment deleted");
        Ok(())
    }
}

impl core::fmt::Debug for StockAssignmentManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockAssignmentManager")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;
    use crate::in_memory::Target;
    use crate::sale::SaleState;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn create_binds_item_and_unit_and_is_empty() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Accepted, 1);
        let item = fx.item(sale, dec!(2));

        let key = fx
            .engine
            .assignment_manager()
            .create(&mut fx.graph, item, Some(unit))
            .unwrap();

        let assignment = fx.graph.assignment(key).unwrap();
        assert!(assignment.is_empty());
        assert_eq!(assignment.unit(), Some(unit));
        assert_eq!(assignment.item(), Some(item));
        assert_eq!(fx.graph.item(item).unwrap().assignments(), &[key]);
    }

    #[test]
    fn create_without_unit_only_binds_item() {
        let mut fx = Fixture::new();
        let sale = fx.sale(SaleState::Accepted, 1);
        let item = fx.item(sale, dec!(2));

        let key = fx
            .engine
            .assignment_manager()
            .create(&mut fx.graph, item, None)
            .unwrap();

        assert_eq!(fx.graph.assignment(key).unwrap().unit(), None);
        assert_eq!(fx.graph.assignment(key).unwrap().item(), Some(item));
    }

    #[test]
    fn removing_a_non_empty_assignment_is_a_logic_error() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Accepted, 1);
        let item = fx.item(sale, dec!(2));
        let key = fx.reserve(unit, item, dec!(2));

        let err = fx
            .engine
            .assignment_manager()
            .remove(&mut fx.graph, key, true)
            .unwrap_err();
        assert!(matches!(err, DomainError::Logic(_)));
    }

    #[test]
    fn last_assignment_of_a_stockable_sale_is_kept_as_placeholder() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Accepted, 1);
        let item = fx.item(sale, dec!(2));
        let key = fx.reserve(unit, item, Decimal::ZERO);

        fx.engine
            .assignment_manager()
            .remove(&mut fx.graph, key, false)
            .unwrap();

        let assignment = fx.graph.assignment(key).unwrap();
        assert_eq!(assignment.unit(), Some(unit));
        assert_eq!(fx.persistence.persist_count(Target::Assignment(key)), 1);
        assert!(fx.persistence.removed().is_empty());
    }

    #[test]
    fn persisted_assignment_is_detached_then_recycled() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Canceled, 1);
        let item = fx.item(sale, dec!(2));
        let key = fx.reserve(unit, item, Decimal::ZERO);
        let manager = fx.engine.assignment_manager().clone();

        manager.remove(&mut fx.graph, key, false).unwrap();

        assert!(fx.graph.assignment(key).unwrap().is_detached());
        assert!(fx.graph.unit(unit).unwrap().assignments().is_empty());
        assert!(manager.cache().borrow().is_removed(fx.graph.assignment(key).unwrap()));

        let recycled = manager.create(&mut fx.graph, item, Some(unit)).unwrap();

        assert_eq!(recycled, key);
        assert_eq!(fx.graph.assignment(key).unwrap().unit(), Some(unit));
        assert_eq!(fx.graph.assignment(key).unwrap().item(), Some(item));
        assert!(!manager.cache().borrow().is_removed(fx.graph.assignment(key).unwrap()));
        assert_eq!(fx.graph.assignment_count(), 1);
    }

    #[test]
    fn transient_assignment_is_deleted_outright() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Canceled, 1);
        let item = fx.item(sale, dec!(2));
        let manager = fx.engine.assignment_manager().clone();
        let key = manager.create(&mut fx.graph, item, Some(unit)).unwrap();

        manager.persist(&mut fx.graph, key).unwrap();

        assert!(!fx.graph.contains_assignment(key));
        assert_eq!(fx.persistence.removed(), vec![Target::Assignment(key)]);
    }

    #[test]
    fn hard_removal_skips_prevention_and_cache() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Accepted, 1);
        let item = fx.item(sale, dec!(2));
        let key = fx.reserve(unit, item, Decimal::ZERO);

        fx.engine
            .assignment_manager()
            .remove(&mut fx.graph, key, true)
            .unwrap();

        assert!(!fx.graph.contains_assignment(key));
        assert!(fx.persistence.is_removed(Target::Assignment(key)));
    }

    #[test]
    fn closing_the_unit_of_work_deletes_pending_removals() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Canceled, 1);
        let item = fx.item(sale, dec!(2));
        let key = fx.reserve(unit, item, Decimal::ZERO);
        let mut uow = UnitOfWork::new();
        fx.engine.subscribe(&mut uow);

        fx.engine
            .assignment_manager()
            .remove(&mut fx.graph, key, false)
            .unwrap();
        assert!(fx.persistence.removed().is_empty());

        uow.close(&mut fx.graph).unwrap();

        assert!(!fx.graph.contains_assignment(key));
        assert_eq!(fx.persistence.removed(), vec![Target::Assignment(key)]);
    }

    #[test]
    fn flush_leaves_an_empty_cache() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Canceled, 1);
        let kept_item = fx.item(sale, dec!(2));
        let dropped_item = fx.item(sale, dec!(1));
        let kept = fx.reserve(unit, kept_item, dec!(2));
        let dropped = fx.reserve(unit, dropped_item, Decimal::ZERO);
        let manager = fx.engine.assignment_manager().clone();

        manager.persist(&mut fx.graph, kept).unwrap();
        manager.remove(&mut fx.graph, dropped, false).unwrap();
        assert_eq!(manager.cache().borrow().find_by_subject(fx.subject), vec![kept]);

        manager.flush(&mut fx.graph).unwrap();

        assert!(!fx.graph.contains_assignment(dropped));
        assert!(manager.cache().borrow_mut().drain_removed().is_empty());
        let cache = manager.cache().borrow();
        assert!(cache.find_by_subject(fx.subject).is_empty());
        assert!(!cache.is_added(fx.graph.assignment(kept).unwrap()));
    }

    #[test]
    fn persisting_a_non_empty_assignment_does_not_recompute() {
        let mut fx = Fixture::new();
        let unit = fx.unit(dec!(5));
        let sale = fx.sale(SaleState::Accepted, 1);
        let item = fx.item(sale, dec!(2));
        let key = fx.reserve(unit, item, dec!(2));

        fx.engine
            .assignment_manager()
            .persist(&mut fx.graph, key)
            .unwrap();

        assert_eq!(
            fx.persistence.journal(),
            vec![crate::in_memory::PersistenceOp::Persist(Target::Assignment(key))]
        );
        assert!(fx.persistence.events().is_empty());
    }
}
