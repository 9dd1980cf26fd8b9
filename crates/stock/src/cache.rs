//! Request-scoped bookkeeping of tentatively added/removed units and assignments.
//!
//! Both caches are keyed by subject identity ([`SubjectKey`]) rather than by
//! database id, since freshly created units have none yet. Within a subject,
//! entries compare by record id when both sides are persisted and by object
//! token otherwise. Adding pops the entry from the removed list and vice versa.

use std::collections::HashMap;

use stockflow_core::{DomainError, DomainResult, Entity, ObjectToken, RecordId};

use crate::assignment::StockAssignment;
use crate::keys::{AssignmentKey, SaleItemKey, SubjectKey, UnitKey};
use crate::unit::StockUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Identity {
    token: ObjectToken,
    id: Option<RecordId>,
}

impl Identity {
    fn of(entity: &impl Entity) -> Self {
        Self {
            token: entity.token(),
            id: entity.record_id(),
        }
    }

    fn matches(&self, other: &Identity) -> bool {
        self.is_same_as(other)
    }
}

impl Entity for Identity {
    fn token(&self) -> ObjectToken {
        self.token
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }
}

trait Cached {
    fn identity(&self) -> &Identity;
}

#[derive(Debug)]
struct Lists<T> {
    added: Vec<T>,
    removed: Vec<T>,
}

impl<T> Default for Lists<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T: Cached> Lists<T> {
    fn add(&mut self, entry: T) {
        let identity = *entry.identity();
        self.removed.retain(|e| !e.identity().matches(&identity));
        if !self.added.iter().any(|e| e.identity().matches(&identity)) {
            self.added.push(entry);
        }
    }

    fn remove(&mut self, entry: T) {
        let identity = *entry.identity();
        self.added.retain(|e| !e.identity().matches(&identity));
        if !self.removed.iter().any(|e| e.identity().matches(&identity)) {
            self.removed.push(entry);
        }
    }

    fn forget(&mut self, identity: &Identity) {
        self.added.retain(|e| !e.identity().matches(identity));
        self.removed.retain(|e| !e.identity().matches(identity));
    }

    fn is_added(&self, identity: &Identity) -> bool {
        self.added.iter().any(|e| e.identity().matches(identity))
    }

    fn is_removed(&self, identity: &Identity) -> bool {
        self.removed.iter().any(|e| e.identity().matches(identity))
    }
}

// --- units ---

#[derive(Debug, Clone, Copy)]
struct CachedUnit {
    key: UnitKey,
    identity: Identity,
}

impl Cached for CachedUnit {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Tentatively added/removed stock units, per subject.
#[derive(Debug, Default)]
pub struct StockUnitCache {
    subjects: HashMap<SubjectKey, Lists<CachedUnit>>,
}

impl StockUnitCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(unit: &StockUnit) -> DomainResult<(SubjectKey, CachedUnit)> {
        let subject = unit
            .subject()
            .ok_or_else(|| DomainError::logic(format!("stock unit {} has no subject", unit.key())))?;
        Ok((
            subject,
            CachedUnit {
                key: unit.key(),
                identity: Identity::of(unit),
            },
        ))
    }

    pub fn add(&mut self, unit: &StockUnit) -> DomainResult<()> {
        let (subject, entry) = Self::entry(unit)?;
        tracing::debug!(unit = %unit.key(), %subject, "unit cache: add");
        self.subjects.entry(subject).or_default().add(entry);
        Ok(())
    }

    pub fn remove(&mut self, unit: &StockUnit) -> DomainResult<()> {
        let (subject, entry) = Self::entry(unit)?;
        tracing::debug!(unit = %unit.key(), %subject, "unit cache: remove");
        self.subjects.entry(subject).or_default().remove(entry);
        Ok(())
    }

    pub fn is_added(&self, unit: &StockUnit) -> bool {
        let identity = Identity::of(unit);
        unit.subject()
            .and_then(|s| self.subjects.get(&s))
            .is_some_and(|lists| lists.is_added(&identity))
    }

    pub fn is_removed(&self, unit: &StockUnit) -> bool {
        let identity = Identity::of(unit);
        unit.subject()
            .and_then(|s| self.subjects.get(&s))
            .is_some_and(|lists| lists.is_removed(&identity))
    }

    /// Units added for `subject` in this unit of work.
    pub fn find_by_subject(&self, subject: SubjectKey) -> Vec<UnitKey> {
        self.subjects
            .get(&subject)
            .map(|lists| lists.added.iter().map(|e| e.key).collect())
            .unwrap_or_default()
    }

    /// Units removed for `subject` in this unit of work.
    pub fn find_removed_by_subject(&self, subject: SubjectKey) -> Vec<UnitKey> {
        self.subjects
            .get(&subject)
            .map(|lists| lists.removed.iter().map(|e| e.key).collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.subjects.clear();
    }
}

// --- assignments ---

#[derive(Debug, Clone, Copy)]
struct CachedAssignment {
    key: AssignmentKey,
    identity: Identity,
    // Links as they were when cached, so a detached assignment can be matched
    // against the (unit, item) pair it used to serve.
    unit: Option<UnitKey>,
    item: Option<SaleItemKey>,
}

impl Cached for CachedAssignment {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl CachedAssignment {
    fn of(assignment: &StockAssignment) -> Self {
        Self {
            key: assignment.key(),
            identity: Identity::of(assignment),
            unit: assignment.unit(),
            item: assignment.item(),
        }
    }
}

/// Tentatively added/removed stock assignments, per subject of their unit.
#[derive(Debug, Default)]
pub struct StockAssignmentCache {
    subjects: HashMap<SubjectKey, Lists<CachedAssignment>>,
}

impl StockAssignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subject: SubjectKey, assignment: &StockAssignment) {
        tracing::debug!(assignment = %assignment.key(), %subject, "assignment cache: add");
        self.subjects
            .entry(subject)
            .or_default()
            .add(CachedAssignment::of(assignment));
    }

    /// Mark an assignment removed. Call before detaching it: its current
    /// unit/item links are what [`find_removed`](Self::find_removed) matches on.
    pub fn remove(&mut self, subject: SubjectKey, assignment: &StockAssignment) {
        tracing::debug!(assignment = %assignment.key(), %subject, "assignment cache: remove");
        self.subjects
            .entry(subject)
            .or_default()
            .remove(CachedAssignment::of(assignment));
    }

    /// Drop every trace of an assignment (it has been hard-deleted).
    pub fn forget(&mut self, assignment: &StockAssignment) {
        let identity = Identity::of(assignment);
        for lists in self.subjects.values_mut() {
            lists.forget(&identity);
        }
    }

    pub fn is_added(&self, assignment: &StockAssignment) -> bool {
        let identity = Identity::of(assignment);
        self.subjects.values().any(|lists| lists.is_added(&identity))
    }

    pub fn is_removed(&self, assignment: &StockAssignment) -> bool {
        let identity = Identity::of(assignment);
        self.subjects.values().any(|lists| lists.is_removed(&identity))
    }

    pub fn find_by_subject(&self, subject: SubjectKey) -> Vec<AssignmentKey> {
        self.subjects
            .get(&subject)
            .map(|lists| lists.added.iter().map(|e| e.key).collect())
            .unwrap_or_default()
    }

    /// A removed assignment that used to bind `item` to `unit`, if any.
    pub fn find_removed(&self, unit: &StockUnit, item: SaleItemKey) -> Option<AssignmentKey> {
        let lists = self.subjects.get(&unit.subject()?)?;
        lists
            .removed
            .iter()
            .find(|e| e.unit == Some(unit.key()) && e.item == Some(item))
            .map(|e| e.key)
    }

    /// Take every assignment still marked removed and reset the cache.
    pub fn drain_removed(&mut self) -> Vec<AssignmentKey> {
        let removed = self
            .subjects
            .values()
            .flat_map(|lists| lists.removed.iter().map(|e| e.key))
            .collect();
        self.subjects.clear();
        removed
    }

    pub fn clear(&mut self) {
        self.subjects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn adding_the_same_unit_twice_keeps_one_entry() {
        let subject = SubjectKey::new();
        let unit = StockUnit::new(subject).with_ordered_quantity(dec!(3));
        let mut cache = StockUnitCache::new();

        cache.add(&unit).unwrap();
        cache.add(&unit).unwrap();

        assert_eq!(cache.find_by_subject(subject), vec![unit.key()]);
        assert!(cache.is_added(&unit));
    }

    #[test]
    fn persisted_units_compare_by_record_id() {
        let subject = SubjectKey::new();
        let id = RecordId::new();
        let loaded = StockUnit::new(subject).with_id(id);
        let reloaded = StockUnit::new(subject).with_id(id);
        let mut cache = StockUnitCache::new();

        cache.add(&loaded).unwrap();
        cache.add(&reloaded).unwrap();

        assert_eq!(cache.find_by_subject(subject).len(), 1);
        assert!(cache.is_added(&reloaded));
    }

    #[test]
    fn remove_pops_from_added_and_add_pops_from_removed() {
        let subject = SubjectKey::new();
        let unit = StockUnit::new(subject);
        let mut cache = StockUnitCache::new();

        cache.add(&unit).unwrap();
        cache.remove(&unit).unwrap();
        assert!(!cache.is_added(&unit));
        assert!(cache.is_removed(&unit));
        assert_eq!(cache.find_removed_by_subject(subject), vec![unit.key()]);

        cache.add(&unit).unwrap();
        assert!(cache.is_added(&unit));
        assert!(!cache.is_removed(&unit));
    }

    #[test]
    fn unit_without_subject_is_rejected() {
        let mut unit = StockUnit::new(SubjectKey::new());
        unit.set_subject(None);
        let err = StockUnitCache::new().add(&unit).unwrap_err();
        assert!(matches!(err, DomainError::Logic(_)));
    }

    #[test]
    fn clear_forgets_everything() {
        let subject = SubjectKey::new();
        let unit = StockUnit::new(subject);
        let mut cache = StockUnitCache::new();
        cache.add(&unit).unwrap();

        cache.clear();

        assert!(cache.find_by_subject(subject).is_empty());
        assert!(!cache.is_added(&unit));
    }

    #[test]
    fn drain_removed_returns_pending_removals_once() {
        let subject = SubjectKey::new();
        let kept = StockAssignment::new().with_id(RecordId::new());
        let dropped = StockAssignment::new().with_id(RecordId::new());
        let mut cache = StockAssignmentCache::new();

        cache.add(subject, &kept);
        cache.remove(subject, &dropped);

        assert!(cache.is_added(&kept));
        assert!(cache.is_removed(&dropped));
        assert_eq!(cache.drain_removed(), vec![dropped.key()]);
        assert!(cache.drain_removed().is_empty());
        assert!(!cache.is_added(&kept));
    }

    #[test]
    fn forget_clears_both_lists() {
        let subject = SubjectKey::new();
        let assignment = StockAssignment::new();
        let mut cache = StockAssignmentCache::new();
        cache.remove(subject, &assignment);

        cache.forget(&assignment);

        assert!(!cache.is_removed(&assignment));
        assert!(cache.find_by_subject(subject).is_empty());
    }
}
