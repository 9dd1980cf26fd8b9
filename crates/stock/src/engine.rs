//! Wiring of caches, managers, updaters and the dispatcher around one
//! persistence helper.

use std::cell::RefCell;
use std::rc::Rc;

use stockflow_events::UnitOfWork;

use crate::assignment_manager::StockAssignmentManager;
use crate::cache::{StockAssignmentCache, StockUnitCache};
use crate::config::StockConfig;
use crate::dispatcher::StockAssignmentDispatcher;
use crate::graph::StockGraph;
use crate::persistence::{DefaultStockFactory, PersistenceHelper, StockFactory};
use crate::state::StockUnitStateResolver;
use crate::unit_manager::StockUnitManager;
use crate::updater::{StockAssignmentUpdater, StockUnitUpdater};

#[derive(Debug, Clone)]
pub struct StockEngine {
    config: StockConfig,
    resolver: StockUnitStateResolver,
    unit_cache: Rc<RefCell<StockUnitCache>>,
    assignment_cache: Rc<RefCell<StockAssignmentCache>>,
    unit_manager: StockUnitManager,
    assignment_manager: StockAssignmentManager,
    unit_updater: StockUnitUpdater,
    assignment_updater: StockAssignmentUpdater,
    dispatcher: StockAssignmentDispatcher,
}

impl StockEngine {
    pub fn new(persistence: Rc<dyn PersistenceHelper>, config: StockConfig) -> Self {
        Self::with_factory(persistence, Rc::new(DefaultStockFactory), config)
    }

    pub fn with_factory(
        persistence: Rc<dyn PersistenceHelper>,
        factory: Rc<dyn StockFactory>,
        config: StockConfig,
    ) -> Self {
        let resolver = StockUnitStateResolver::new();
        let unit_cache = Rc::new(RefCell::new(StockUnitCache::new()));
        let assignment_cache = Rc::new(RefCell::new(StockAssignmentCache::new()));

        let unit_manager =
            StockUnitManager::new(Rc::clone(&persistence), resolver, Rc::clone(&unit_cache));
        let assignment_manager =
            StockAssignmentManager::new(persistence, factory, Rc::clone(&assignment_cache));
        let unit_updater = StockUnitUpdater::new(unit_manager.clone());
        let assignment_updater =
            StockAssignmentUpdater::new(assignment_manager.clone(), unit_updater.clone());
        let dispatcher = StockAssignmentDispatcher::new(
            assignment_manager.clone(),
            unit_manager.clone(),
            config.default_direction,
        );

        Self {
            config,
            resolver,
            unit_cache,
            assignment_cache,
            unit_manager,
            assignment_manager,
            unit_updater,
            assignment_updater,
            dispatcher,
        }
    }

    /// Register the queue-close listeners: unit cache reset, then the
    /// assignment removal flush.
    pub fn subscribe(&self, uow: &mut UnitOfWork<StockGraph>) {
        self.unit_manager.subscribe(uow);
        self.assignment_manager.subscribe(uow);
    }

    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    pub fn resolver(&self) -> &StockUnitStateResolver {
        &self.resolver
    }

    pub fn unit_cache(&self) -> &RefCell<StockUnitCache> {
        &self.unit_cache
    }

    pub fn assignment_cache(&self) -> &RefCell<StockAssignmentCache> {
        &self.assignment_cache
    }

    pub fn unit_manager(&self) -> &StockUnitManager {
        &self.unit_manager
    }

    pub fn assignment_manager(&self) -> &StockAssignmentManager {
        &self.assignment_manager
    }

    pub fn unit_updater(&self) -> &StockUnitUpdater {
        &self.unit_updater
    }

    pub fn assignment_updater(&self) -> &StockAssignmentUpdater {
        &self.assignment_updater
    }

    pub fn dispatcher(&self) -> &StockAssignmentDispatcher {
        &self.dispatcher
    }
}
