//! Domain events and unit-of-work lifecycle.

pub mod event;
pub mod unit_of_work;

pub use event::Event;
pub use unit_of_work::UnitOfWork;
