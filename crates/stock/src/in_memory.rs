//! In-memory persistence helper for tests/dev.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use stockflow_core::ObjectToken;

use crate::event::{AssignmentRemoved, StockEvent, UnitChanged, UnitRemoved};
use crate::keys::{AssignmentKey, UnitKey};
use crate::persistence::{ChangeSet, EntityRef, PersistenceHelper, TrackedField};

/// What an operation targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Unit(UnitKey),
    Assignment(AssignmentKey),
}

impl From<EntityRef<'_>> for Target {
    fn from(entity: EntityRef<'_>) -> Self {
        match entity {
            EntityRef::Unit(u) => Target::Unit(u.key()),
            EntityRef::Assignment(a) => Target::Assignment(a.key()),
        }
    }
}

/// One scheduled persistence operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOp {
    Persist(Target),
    PersistAndRecompute { target: Target, schedule_event: bool },
    Remove { target: Target, schedule_event: bool },
}

impl PersistenceOp {
    pub fn target(&self) -> Target {
        match self {
            PersistenceOp::Persist(t) => *t,
            PersistenceOp::PersistAndRecompute { target, .. } => *target,
            PersistenceOp::Remove { target, .. } => *target,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    snapshots: HashMap<ObjectToken, HashMap<TrackedField, Decimal>>,
    journal: Vec<PersistenceOp>,
    events: Vec<StockEvent>,
}

/// Journal-keeping [`PersistenceHelper`].
///
/// - No IO
/// - `track` plays the role of hydration: the values seen at that point are
///   what change sets compare against
/// - Scheduled events are collected, not dispatched
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    inner: RefCell<Inner>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the stored values of an entity.
    pub fn track(&self, entity: EntityRef<'_>) {
        let values = TrackedField::ALL
            .iter()
            .filter_map(|f| entity.field(*f).map(|v| (*f, v)))
            .collect();
        self.inner.borrow_mut().snapshots.insert(entity.token(), values);
    }

    pub fn journal(&self) -> Vec<PersistenceOp> {
        self.inner.borrow().journal.clone()
    }

    pub fn events(&self) -> Vec<StockEvent> {
        self.inner.borrow().events.clone()
    }

    /// Targets of every scheduled delete, in order.
    pub fn removed(&self) -> Vec<Target> {
        self.inner
            .borrow()
            .journal
            .iter()
            .filter(|op| matches!(op, PersistenceOp::Remove { .. }))
            .map(PersistenceOp::target)
            .collect()
    }

    pub fn is_removed(&self, target: Target) -> bool {
        self.removed().contains(&target)
    }

    /// Number of inserts/updates scheduled for `target`.
    pub fn persist_count(&self, target: Target) -> usize {
        self.inner
            .borrow()
            .journal
            .iter()
            .filter(|op| !matches!(op, PersistenceOp::Remove { .. }) && op.target() == target)
            .count()
    }

    pub fn clear_journal(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.journal.clear();
        inner.events.clear();
    }

    fn record(&self, op: PersistenceOp) {
        tracing::debug!(?op, "persistence: scheduled");
        self.inner.borrow_mut().journal.push(op);
    }
}

impl PersistenceHelper for InMemoryPersistence {
    fn persist(&self, entity: EntityRef<'_>) {
        self.record(PersistenceOp::Persist(entity.into()));
    }

    fn persist_and_recompute(&self, entity: EntityRef<'_>, schedule_event: bool) {
        let target = Target::from(entity);
        self.record(PersistenceOp::PersistAndRecompute {
            target,
            schedule_event,
        });

        if let (true, Target::Unit(unit)) = (schedule_event, target) {
            self.inner
                .borrow_mut()
                .events
                .push(StockEvent::UnitChanged(UnitChanged {
                    unit,
                    occurred_at: Utc::now(),
                }));
        }
    }

    fn remove(&self, entity: EntityRef<'_>, schedule_event: bool) {
        let target = Target::from(entity);
        self.record(PersistenceOp::Remove {
            target,
            schedule_event,
        });

        if schedule_event {
            let occurred_at = Utc::now();
            let event = match target {
                Target::Unit(unit) => StockEvent::UnitRemoved(UnitRemoved { unit, occurred_at }),
                Target::Assignment(assignment) => StockEvent::AssignmentRemoved(AssignmentRemoved {
                    assignment,
                    occurred_at,
                }),
            };
            self.inner.borrow_mut().events.push(event);
        }
    }

    fn is_changed(&self, entity: EntityRef<'_>, field: TrackedField) -> bool {
        self.change_set(entity, field).is_some()
    }

    fn change_set(&self, entity: EntityRef<'_>, field: TrackedField) -> Option<ChangeSet> {
        let new = entity.field(field)?;
        let inner = self.inner.borrow();
        let old = *inner.snapshots.get(&entity.token())?.get(&field)?;
        (old != new).then_some(ChangeSet { old, new })
    }
}
