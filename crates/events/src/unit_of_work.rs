//! Unit-of-work lifecycle ("queue close").
//!
//! A unit of work is the transactional scope inside which request-scoped
//! caches are valid. Components that keep such state register a close
//! listener instead of implementing a framework subscriber interface; the
//! owner of the unit of work calls [`UnitOfWork::close`] once the scope
//! commits.

use stockflow_core::DomainResult;

type CloseListener<C> = Box<dyn FnMut(&mut C) -> DomainResult<()>>;

/// Ordered set of close listeners over a context `C` (typically the object
/// graph the unit of work operates on).
pub struct UnitOfWork<C> {
    listeners: Vec<CloseListener<C>>,
    cycles: u64,
}

impl<C> UnitOfWork<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener fired on every [`close`](Self::close).
    pub fn on_close(&mut self, listener: impl FnMut(&mut C) -> DomainResult<()> + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of completed close cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Close the current unit of work.
    ///
    /// Listeners run in registration order. The first error aborts the
    /// remaining listeners and is returned as is; listeners stay registered
    /// for the next cycle either way.
    pub fn close(&mut self, context: &mut C) -> DomainResult<()> {
        tracing::debug!(listeners = self.listeners.len(), cycle = self.cycles, "closing unit of work");

        for listener in &mut self.listeners {
            listener(context)?;
        }

        self.cycles += 1;
        Ok(())
    }
}

impl<C> Default for UnitOfWork<C> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            cycles: 0,
        }
    }
}

impl<C> core::fmt::Debug for UnitOfWork<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("listeners", &self.listeners.len())
            .field("cycles", &self.cycles)
            .finish()
    }
}
