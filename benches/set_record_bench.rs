use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nullcore::set_record::{SetRecord, MARKED, NULLIFIABLE};

fn seeded_record(max_m: u64) -> SetRecord {
    let mut sr = SetRecord::initialize(4);
    sr.allocate(4, 1, max_m, &[]).unwrap();
    let mut set = vec![1u64, 2, 3, 4];
    for step in 0..2000u64 {
        nullcore::combinadic::set_from_index(4, step * 37, &mut set);
        let _ = sr.mark(&set, NULLIFIABLE);
    }
    sr
}

fn bench_mark(c: &mut Criterion) {
    let sr = seeded_record(20);
    let set = [2u64, 5, 11, 19];
    c.bench_function("mark(single set, already sized)", |b| {
        b.iter(|| sr.mark(black_box(&set), black_box(NULLIFIABLE)));
    });
}

fn bench_query_single_threaded(c: &mut Criterion) {
    let sr = seeded_record(16);
    c.bench_function("query(MARKED, full scan, M=16)", |b| {
        b.iter(|| {
            let mut count = 0u64;
            sr.query(MARKED, NULLIFIABLE, None, |_set, _size, _bits| count += 1);
            black_box(count)
        });
    });
}

fn bench_query_parallel_four_workers(c: &mut Criterion) {
    let sr = seeded_record(16);
    c.bench_function("query_parallel(4 workers, M=16)", |b| {
        b.iter(|| {
            let mut total = 0u64;
            for worker in 0..4u64 {
                total += sr.query_parallel(MARKED, NULLIFIABLE, 4, worker, None, |_, _, _| {});
            }
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    bench_mark,
    bench_query_single_threaded,
    bench_query_parallel_four_workers,
);
criterion_main!(benches);
