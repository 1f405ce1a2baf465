//! Criterion benchmarks for the Affinity pipeline.
//!
//! Covers the stages that dominate a run:
//! - Field extraction from JSON lines
//! - Parallel aggregation of coded records
//! - ALS training and top-N recommendation

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use affinity::aggregate::InteractionAggregator;
use affinity::codec::{CodedRecord, ItemCodeTable};
use affinity::model::{AlsConfig, AlsTrainer, Trainer};
use affinity::record::{FieldPath, FieldPaths, PathExtractor};
use affinity::recommend::Recommender;

/// Generate `count` usage events spread over a fixed set of users and apps.
fn generate_events(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                r#"{{"user": {{"id": {}}}, "payload": {{"app": "app{}", "ts": {i}}}}}"#,
                i % 500,
                (i * 7) % 200
            )
        })
        .collect()
}

fn generate_records(count: usize) -> Vec<CodedRecord> {
    (0..count)
        .map(|i| CodedRecord::occurrence((i % 500) as i64, ((i * 7) % 200) as u32))
        .collect()
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let mut paths = FieldPaths::new();
    paths.insert("user_id".to_string(), FieldPath::parse("user.id").unwrap());
    paths.insert("app_id".to_string(), FieldPath::parse("payload.app").unwrap());
    let extractor = PathExtractor::new(paths);
    let events = generate_events(1_000);

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("flatten_lines", |b| {
        b.iter(|| {
            for line in &events {
                black_box(extractor.flatten_line(line).unwrap());
            }
        })
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let records = generate_records(100_000);

    group.throughput(Throughput::Elements(records.len() as u64));
    for partitions in [1, 8] {
        let aggregator = InteractionAggregator::new(partitions);
        group.bench_function(format!("aggregate_{partitions}_partitions"), |b| {
            b.iter(|| black_box(aggregator.aggregate(&records)))
        });
    }

    group.finish();
}

fn bench_als(c: &mut Criterion) {
    let mut group = c.benchmark_group("als");
    group.sample_size(10);

    let records = generate_records(20_000);
    let interactions = InteractionAggregator::new(4).aggregate(&records);
    let triples = interactions.to_triples();
    let mut codes = ItemCodeTable::new();
    for i in 0..200 {
        codes.get_or_assign(&format!("app{i}")).unwrap();
    }
    let trainer = AlsTrainer::new(AlsConfig::default().with_num_iterations(5));

    group.bench_function("train", |b| {
        b.iter(|| black_box(trainer.train(&triples).unwrap()))
    });

    let model = trainer.train(&triples).unwrap();
    let recommender = Recommender::new(&model, &interactions, &codes);
    group.bench_function("recommend_top_10", |b| {
        b.iter(|| black_box(recommender.recommend(black_box(42), 10).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_extraction, bench_aggregation, bench_als);
criterion_main!(benches);
