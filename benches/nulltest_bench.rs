use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nullcore::expansion::EquivalentPairs;
use nullcore::nulltest::nullifiable;

fn bench_nulltest_size_three(c: &mut Criterion) {
    c.bench_function("nullifiable(size-3, closed form miss)", |b| {
        b.iter(|| nullifiable(black_box(&[2, 6, 15])));
    });
}

fn bench_nulltest_size_four_innullifiable(c: &mut Criterion) {
    // Known innullifiable at N=4, M=9 — worst case, every branch is explored.
    c.bench_function("nullifiable(size-4, innullifiable)", |b| {
        b.iter(|| nullifiable(black_box(&[1, 4, 6, 8])));
    });
}

fn bench_nulltest_size_five_innullifiable(c: &mut Criterion) {
    c.bench_function("nullifiable(size-5, innullifiable)", |b| {
        b.iter(|| nullifiable(black_box(&[1, 4, 6, 8, 17])));
    });
}

fn bench_equivalent_pairs_build(c: &mut Criterion) {
    c.bench_function("EquivalentPairs::build(M=120)", |b| {
        b.iter(|| EquivalentPairs::build(black_box(120)));
    });
}

criterion_group!(
    benches,
    bench_nulltest_size_three,
    bench_nulltest_size_four_innullifiable,
    bench_nulltest_size_five_innullifiable,
    bench_equivalent_pairs_build,
);
criterion_main!(benches);
