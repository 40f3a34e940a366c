//! Benchmarks for mmapkv store operations

use criterion::{criterion_group, criterion_main, Criterion};
use mmapkv::{Store, StoreConfig, Value};
use tempfile::TempDir;

fn bench_put(c: &mut Criterion) {
    c.bench_function("put_small_record", |b| {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bench.mmkv");
        // Large threshold so the benchmark measures buffering, not flush I/O
        let config = StoreConfig::builder()
            .flush_threshold(256 * 1024 * 1024)
            .build();
        let mut store = Store::open_with_config(&path, false, config).unwrap();
        let mut i: u64 = 0;
        b.iter(|| {
            store
                .put(&format!("key{}", i), &Value::UInt(i))
                .unwrap();
            i += 1;
        });
    });
}

fn bench_get(c: &mut Criterion) {
    c.bench_function("get_persisted_record", |b| {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bench.mmkv");
        let mut store = Store::open_or_create(&path, false).unwrap();
        for i in 0..10_000u64 {
            store.put(&format!("key{}", i), &Value::UInt(i)).unwrap();
        }
        store.flush().unwrap();
        let mut i: u64 = 0;
        b.iter(|| {
            let value = store.get(&format!("key{}", i % 10_000)).unwrap();
            assert_eq!(value, Value::UInt(i % 10_000));
            i += 1;
        });
    });
}

fn bench_reopen(c: &mut Criterion) {
    c.bench_function("reopen_10k_records", |b| {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bench.mmkv");
        let mut store = Store::open_or_create(&path, false).unwrap();
        for i in 0..10_000u64 {
            store.put(&format!("key{}", i), &Value::UInt(i)).unwrap();
        }
        store.close().unwrap();
        b.iter(|| {
            let store = Store::open_or_create(&path, true).unwrap();
            assert_eq!(store.len(), 10_000);
        });
    });
}

criterion_group!(benches, bench_put, bench_get, bench_reopen);
criterion_main!(benches);
