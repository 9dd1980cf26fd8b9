//! Entity trait: identity + continuity across state changes.

use crate::id::{ObjectToken, RecordId};

/// Entity marker + minimal interface.
///
/// Entities carry two identities: an in-process [`ObjectToken`] issued at
/// construction, and a database [`RecordId`] that only exists once the row has
/// been persisted.
pub trait Entity {
    /// Process-local identity, stable for the entity's whole life in memory.
    fn token(&self) -> ObjectToken;

    /// Database identity, if the entity has been persisted.
    fn record_id(&self) -> Option<RecordId>;

    fn is_persisted(&self) -> bool {
        self.record_id().is_some()
    }

    /// Whether `self` and `other` denote the same row.
    ///
    /// Persisted entities compare by record id, transient ones by token.
    fn is_same_as(&self, other: &impl Entity) -> bool
    where
        Self: Sized,
    {
        match (self.record_id(), other.record_id()) {
            (Some(a), Some(b)) => a == b,
            _ => self.token() == other.token(),
        }
    }
}
