//! Document codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reaper_bench::sample_feed;
use reaper_codec::{Document, ObjectId};
use reaper_core::Category;

fn bench_category(c: &mut Criterion) {
    let mut group = c.benchmark_group("category");
    let category = Category {
        id: ObjectId::new(),
        name: "Technology".into(),
    };
    let bytes = category.encode().unwrap();

    group.bench_function("encode", |b| {
        b.iter(|| black_box(black_box(&category).encode().unwrap()));
    });
    group.bench_function("decode", |b| {
        b.iter(|| black_box(Category::decode(black_box(&bytes)).unwrap()));
    });
    group.finish();
}

fn bench_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed");

    for articles in [10usize, 100, 500] {
        let feed = sample_feed(articles, 10);
        let bytes = feed.encode().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", articles), &feed, |b, feed| {
            b.iter(|| black_box(feed.encode().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", articles), &bytes, |b, bytes| {
            b.iter(|| black_box(reaper_core::Feed::decode(bytes).unwrap()));
        });
    }
    group.finish();
}

fn bench_object_id(c: &mut Criterion) {
    let id = ObjectId::new();
    let hex = id.to_hex();
    c.bench_function("object_id/new", |b| b.iter(|| black_box(ObjectId::new())));
    c.bench_function("object_id/to_hex", |b| b.iter(|| black_box(id.to_hex())));
    c.bench_function("object_id/parse_hex", |b| {
        b.iter(|| black_box(ObjectId::parse_hex(black_box(&hex)).unwrap()));
    });
}

criterion_group!(benches, bench_category, bench_feed, bench_object_id);
criterion_main!(benches);
