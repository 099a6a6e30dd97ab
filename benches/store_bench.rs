// 存储层性能基准测试
//
// 使用 Criterion 框架测试：
// - 单条读数写入延迟（WAL 模式文件库）
// - 分页查询延迟
// - 最新读数查询延迟
// - 保留期清理
//
// 运行: cargo bench --bench store_bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tempfile::TempDir;

use templog::utils::clock::{Clock, MockClock};
use templog::utils::config::StorageConfig;
use templog::{BucketKind, QueryFilter, SensorStore};

fn open_store(dir: &TempDir, clock: Arc<dyn Clock>) -> SensorStore {
    let config = StorageConfig::with_path(dir.path().join("bench.db").to_string_lossy().to_string());
    SensorStore::open(&config, clock).unwrap()
}

/// 每秒一条 raw 读数
fn seed(store: &SensorStore, clock: &MockClock, rows: usize) {
    for i in 0..rows {
        store.insert(BucketKind::Raw, 15.0 + (i % 50) as f64 * 0.1).unwrap();
        clock.advance(Duration::seconds(1));
    }
}

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_insert");
    group.throughput(Throughput::Elements(1));

    let dir = TempDir::new().unwrap();
    let clock = Arc::new(MockClock::with_time(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let store = open_store(&dir, clock.clone());

    group.bench_function("raw", |b| {
        b.iter(|| {
            store.insert(black_box(BucketKind::Raw), black_box(18.25)).unwrap();
        })
    });

    group.finish();
}

fn benchmark_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_query");

    let dir = TempDir::new().unwrap();
    let clock = Arc::new(MockClock::with_time(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let store = open_store(&dir, clock.clone());
    seed(&store, &clock, 10_000);

    for limit in [20u32, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("page", limit), &limit, |b, &limit| {
            let filter = QueryFilter::default().with_kind(BucketKind::Raw).with_page(100, limit);
            b.iter(|| black_box(store.query(black_box(&filter)).unwrap()))
        });
    }

    group.bench_function("latest", |b| {
        b.iter(|| black_box(store.query_latest().unwrap()))
    });

    group.finish();
}

fn benchmark_retention(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_retention");

    // 无过期数据时的清理开销（每条读数都会触发一次）
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(MockClock::with_time(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let store = open_store(&dir, clock.clone());
    seed(&store, &clock, 10_000);

    group.bench_function("sweep_nothing_expired", |b| {
        b.iter(|| {
            for kind in BucketKind::ALL {
                black_box(store.delete_expired(kind, Duration::hours(24)).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_insert, benchmark_query, benchmark_retention);
criterion_main!(benches);
