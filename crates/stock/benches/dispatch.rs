use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use std::rc::Rc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use stockflow_core::RecordId;
use stockflow_stock::{
    InMemoryPersistence, PersistenceHelper, Sale, SaleItem, SaleState, SortDirection,
    StockAssignment, StockConfig, StockEngine, StockGraph, StockUnit, SubjectKey, UnitKey,
};

/// A source unit holding `reservations` single-piece reservations (one sale
/// each, one day apart) and an empty target with room for all of them.
fn setup(reservations: usize) -> (StockGraph, StockEngine, UnitKey, UnitKey) {
    let persistence: Rc<dyn PersistenceHelper> = Rc::new(InMemoryPersistence::new());
    let engine = StockEngine::new(persistence, StockConfig::default());
    let mut graph = StockGraph::new();
    let subject = SubjectKey::new();
    let capacity = Decimal::from(reservations as u64);

    let source = graph.insert_unit(
        StockUnit::new(subject)
            .with_id(RecordId::new())
            .with_ordered_quantity(capacity),
    );
    let target = graph.insert_unit(
        StockUnit::new(subject)
            .with_id(RecordId::new())
            .with_ordered_quantity(capacity),
    );

    let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for n in 0..reservations {
        let sale = graph.insert_sale(Sale::new(SaleState::Accepted, epoch + Duration::days(n as i64)));
        let item = graph
            .insert_item(SaleItem::new(sale, subject, Decimal::ONE))
            .unwrap();
        graph
            .attach_assignment(
                StockAssignment::new()
                    .with_id(RecordId::new())
                    .with_sold_quantity(Decimal::ONE),
                source,
                item,
            )
            .unwrap();
    }
    graph.unit_mut(source).unwrap().set_sold_quantity(capacity);

    (graph, engine, source, target)
}

fn bench_move_assignments(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_assignments");

    for reservations in [10usize, 100, 1_000] {
        let half = Decimal::from((reservations / 2) as u64);
        group.throughput(Throughput::Elements(reservations as u64 / 2));

        for direction in [SortDirection::Asc, SortDirection::Desc] {
            group.bench_with_input(
                BenchmarkId::new(format!("{direction:?}").to_lowercase(), reservations),
                &reservations,
                |b, &reservations| {
                    b.iter_batched(
                        || setup(reservations),
                        |(mut graph, engine, source, target)| {
                            let moved = engine
                                .dispatcher()
                                .move_assignments(&mut graph, source, target, black_box(half), direction)
                                .unwrap();
                            black_box(moved);
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_move_assignments);
criterion_main!(benches);
