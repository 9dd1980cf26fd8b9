//! Stock allocation and reservation engine.
//!
//! Tracks supply ([`StockUnit`]), binds it to demand ([`StockAssignment`]),
//! moves that binding between units while conserving quantities, resolves
//! unit lifecycle states, and defers persistence decisions through
//! request-scoped caches. Everything is synchronous, in-process logic; storage
//! is reached only through [`PersistenceHelper`].

pub mod assignment;
pub mod assignment_manager;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod event;
pub mod graph;
pub mod in_memory;
pub mod keys;
pub mod persistence;
pub mod sale;
pub mod state;
pub mod unit;
pub mod unit_manager;
pub mod updater;

#[cfg(test)]
mod fixtures;

pub use assignment::StockAssignment;
pub use assignment_manager::StockAssignmentManager;
pub use cache::{StockAssignmentCache, StockUnitCache};
pub use config::StockConfig;
pub use dispatcher::{SortDirection, StockAssignmentDispatcher};
pub use engine::StockEngine;
pub use event::{AssignmentRemoved, StockEvent, UnitChanged, UnitRemoved};
pub use graph::StockGraph;
pub use in_memory::{InMemoryPersistence, PersistenceOp, Target};
pub use keys::{AssignmentKey, SaleItemKey, SaleKey, SubjectKey, UnitKey};
pub use persistence::{
    ChangeSet, DefaultStockFactory, EntityRef, PersistenceHelper, StockFactory, TrackedField,
};
pub use sale::{Sale, SaleItem, SaleState};
pub use state::StockUnitStateResolver;
pub use unit::{StockUnit, StockUnitState};
pub use unit_manager::StockUnitManager;
pub use updater::{StockAssignmentUpdater, StockUnitUpdater};
