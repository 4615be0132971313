//! Criterion benchmarks for parameter-space hot paths.
//!
//! Benchmarks:
//! 1. Axis resolution (ranges, sets, nested slots)
//! 2. Trial counting without enumeration
//! 3. Full enumeration of a nested space
//! 4. Unranking single trial indices
//! 5. Combination fingerprinting

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use paramlab_core::{
    DiscreteSetAxis, ModuleSlotAxis, ModuleVariant, NumericRangeAxis, Scalar, SpaceDescriptor,
    UnresolvedAxis,
};

// ── Helpers ──────────────────────────────────────────────────────────

/// Lookback range of `n` values, an MA-type set, and a two-level exit slot.
fn make_axes(n: i64) -> Vec<UnresolvedAxis> {
    let regime = ModuleSlotAxis {
        name: "regime".into(),
        capability: "regime".into(),
        variants: vec![
            ModuleVariant::new("off", vec![]),
            ModuleVariant::new(
                "ma_regime",
                vec![NumericRangeAxis::integer("ma_period", 100, 200, 25).into()],
            ),
        ],
    };
    vec![
        NumericRangeAxis::integer("lookback", 10, 10 + (n - 1) * 5, 5).into(),
        DiscreteSetAxis::new("ma_type", vec!["sma".into(), "ema".into(), "wma".into()]).into(),
        ModuleSlotAxis {
            name: "exit".into(),
            capability: "position_manager".into(),
            variants: vec![
                ModuleVariant::new("no_op", vec![]),
                ModuleVariant::new(
                    "atr_trailing",
                    vec![
                        NumericRangeAxis::float("multiplier", 1.5, 4.0, 0.5).into(),
                        regime.into(),
                    ],
                ),
                ModuleVariant::new(
                    "percent_trailing",
                    vec![DiscreteSetAxis::new(
                        "trail_pct",
                        vec![Scalar::Float(0.05), Scalar::Float(0.1), Scalar::Float(0.2)],
                    )
                    .into()],
                ),
            ],
        }
        .into(),
    ]
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_resolve(c: &mut Criterion) {
    let axes = make_axes(50);
    c.bench_function("resolve_nested_space", |b| {
        b.iter(|| SpaceDescriptor::resolve("bench", black_box(&axes)).unwrap())
    });
}

fn bench_count(c: &mut Criterion) {
    let space = SpaceDescriptor::resolve("bench", &make_axes(50)).unwrap();
    c.bench_function("estimate_count", |b| {
        b.iter(|| black_box(&space).estimate_count().unwrap())
    });
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");
    for n in [10_i64, 50, 200] {
        let space = SpaceDescriptor::resolve("bench", &make_axes(n)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &space, |b, space| {
            b.iter(|| space.enumerate().unwrap().count())
        });
    }
    group.finish();
}

fn bench_unrank(c: &mut Criterion) {
    let space = SpaceDescriptor::resolve("bench", &make_axes(200)).unwrap();
    let total = space.estimate_count().unwrap() as u64;
    c.bench_function("combination_at", |b| {
        let mut i = 0_u64;
        b.iter(|| {
            i = (i + 7_919) % total;
            space.combination_at(black_box(i)).unwrap()
        })
    });
}

fn bench_fingerprint(c: &mut Criterion) {
    let space = SpaceDescriptor::resolve("bench", &make_axes(10)).unwrap();
    let combos: Vec<_> = space.enumerate().unwrap().collect();
    c.bench_function("fingerprint_all", |b| {
        b.iter(|| combos.iter().map(|c| c.fingerprint()).count())
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_count,
    bench_enumerate,
    bench_unrank,
    bench_fingerprint
);
criterion_main!(benches);
