//! Shared test fixtures.

use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use stockflow_core::RecordId;

use crate::assignment::StockAssignment;
use crate::config::StockConfig;
use crate::engine::StockEngine;
use crate::graph::StockGraph;
use crate::in_memory::InMemoryPersistence;
use crate::keys::{AssignmentKey, SaleItemKey, SaleKey, SubjectKey, UnitKey};
use crate::persistence::{EntityRef, PersistenceHelper};
use crate::sale::{Sale, SaleItem, SaleState};
use crate::unit::StockUnit;

pub(crate) struct Fixture {
    pub graph: StockGraph,
    pub persistence: Rc<InMemoryPersistence>,
    pub engine: StockEngine,
    pub subject: SubjectKey,
}

impl Fixture {
    pub fn new() -> Self {
        let persistence = Rc::new(InMemoryPersistence::new());
        let helper: Rc<dyn PersistenceHelper> = persistence.clone();
        Self {
            graph: StockGraph::new(),
            engine: StockEngine::new(helper, StockConfig::default()),
            persistence,
            subject: SubjectKey::new(),
        }
    }

    fn day(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(day)
    }

    /// A persisted, supplier-linked unit of the fixture subject.
    pub fn unit(&mut self, ordered: Decimal) -> UnitKey {
        self.graph.insert_unit(
            StockUnit::new(self.subject)
                .with_id(RecordId::new())
                .with_supplier_order_item(RecordId::new())
                .with_ordered_quantity(ordered),
        )
    }

    pub fn track_unit(&self, unit: UnitKey) {
        self.persistence
            .track(EntityRef::Unit(self.graph.unit(unit).unwrap()));
    }

    /// A sale created `day` days after the fixture epoch.
    pub fn sale(&mut self, state: SaleState, day: i64) -> SaleKey {
        self.graph
            .insert_sale(Sale::new(state, Self::day(day)).with_id(RecordId::new()))
    }

    pub fn item(&mut self, sale: SaleKey, quantity: Decimal) -> SaleItemKey {
        self.graph
            .insert_item(SaleItem::new(sale, self.subject, quantity).with_id(RecordId::new()))
            .unwrap()
    }

    /// A persisted assignment of `sold` from `unit` to `item`; the unit's sold
    /// quantity is raised accordingly.
    pub fn reserve(&mut self, unit: UnitKey, item: SaleItemKey, sold: Decimal) -> AssignmentKey {
        let key = self
            .graph
            .attach_assignment(
                StockAssignment::new()
                    .with_id(RecordId::new())
                    .with_sold_quantity(sold),
                unit,
                item,
            )
            .unwrap();
        let u = self.graph.unit_mut(unit).unwrap();
        u.set_sold_quantity(u.sold_quantity() + sold);
        key
    }
}
