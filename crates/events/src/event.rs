use chrono::{DateTime, Utc};

/// A fact scheduled by the persistence layer after a stock change.
///
/// Events are recorded when a helper is asked to schedule one and handed to
/// whatever recomputes dependents; the engine never consumes them itself.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted event name, e.g. `stock.unit.changed`.
    fn event_type(&self) -> &'static str;

    /// Payload version of `event_type`.
    fn version(&self) -> u32;

    /// When the change happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}
