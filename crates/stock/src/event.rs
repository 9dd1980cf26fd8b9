use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_events::Event;

use crate::keys::{AssignmentKey, UnitKey};

/// Event: a unit was persisted and its dependents must be recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitChanged {
    pub unit: UnitKey,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a unit was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRemoved {
    pub unit: UnitKey,
    pub occurred_at: DateTime<Utc>,
}

/// Event: an assignment was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRemoved {
    pub assignment: AssignmentKey,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    UnitChanged(UnitChanged),
    UnitRemoved(UnitRemoved),
    AssignmentRemoved(AssignmentRemoved),
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::UnitChanged(_) => "stock.unit.changed",
            StockEvent::UnitRemoved(_) => "stock.unit.removed",
            StockEvent::AssignmentRemoved(_) => "stock.assignment.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::UnitChanged(e) => e.occurred_at,
            StockEvent::UnitRemoved(e) => e.occurred_at,
            StockEvent::AssignmentRemoved(e) => e.occurred_at,
        }
    }
}
