//! Engine benchmarks: set/get/overwrite throughput with and without a WAL.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slotdb_bench::{open_temp_db, payload};
use std::time::Duration;

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");
    group.sample_size(50);

    for size in [64usize, 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("no_wal", size), size, |b, &size| {
            let (_dir, db) = open_temp_db(false);
            let value = payload(size);
            let mut i = 0u64;

            b.iter(|| {
                let key = format!("key-{i}");
                i += 1;
                db.set(black_box(&key), black_box(&value), Duration::ZERO)
                    .unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("wal", size), size, |b, &size| {
            let (_dir, db) = open_temp_db(true);
            let value = payload(size);
            let mut i = 0u64;

            b.iter(|| {
                let key = format!("key-{i}");
                i += 1;
                db.set(black_box(&key), black_box(&value), Duration::ZERO)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    let (_dir, db) = open_temp_db(false);
    let value = payload(256);
    let count = 1000u64;

    for i in 0..count {
        db.set(&format!("key-{i}"), &value, Duration::ZERO).unwrap();
    }

    group.bench_function("hit_1000_keys", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key-{}", (i * 7) % count);
            i += 1;
            let result = db.get(black_box(&key)).unwrap();
            black_box(result);
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            let result = db.get(black_box("absent-key"));
            let _ = black_box(result);
        });
    });

    group.finish();
}

fn bench_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("overwrite");
    group.sample_size(50);

    // Repeated overwrites of one key exercise tombstoning plus slot reuse.
    group.bench_function("same_key_same_size", |b| {
        let (_dir, db) = open_temp_db(false);
        let value = payload(256);
        db.set("hot-key", &value, Duration::ZERO).unwrap();

        b.iter(|| {
            db.set(black_box("hot-key"), black_box(&value), Duration::ZERO)
                .unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_overwrite);
criterion_main!(benches);
