use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use khata_alerts::evaluate;
use khata_core::{ProductId, ProductRecord};
use khata_ledger::MovementKind;

fn bench_apply_to(c: &mut Criterion) {
    let kinds = [
        MovementKind::In,
        MovementKind::Out,
        MovementKind::Adjustment,
        MovementKind::Return,
        MovementKind::Damage,
        MovementKind::Loss,
    ];

    c.bench_function("movement_apply_cycle", |b| {
        b.iter(|| {
            let mut on_hand = 500i64;
            for (i, kind) in kinds.iter().cycle().take(1_000).enumerate() {
                on_hand = kind.apply_to(on_hand, (i % 17) as i64);
            }
            on_hand
        })
    });
}

fn bench_alert_evaluation(c: &mut Criterion) {
    c.bench_function("alert_evaluate_1000_products", |b| {
        b.iter_batched(
            || {
                (0..1_000)
                    .map(|i| {
                        ProductRecord::new(ProductId::new(), format!("product-{i}"))
                            .with_low_stock_threshold(5)
                    })
                    .map(|mut p| {
                        p.on_hand = (p.low_stock_threshold * 4) % 23;
                        p
                    })
                    .collect::<Vec<_>>()
            },
            |products| {
                products
                    .iter()
                    .map(|p| evaluate(p).len())
                    .sum::<usize>()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_apply_to, bench_alert_evaluation);
criterion_main!(benches);
