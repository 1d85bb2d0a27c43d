use criterion::{Criterion, criterion_group, criterion_main};
use docvec::ingest::DimensionPolicy;
use docvec::ingest::record::{normalize_embedding, parse_line};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let embedding: Vec<f32> = (0..384).map(|i| (i as f32) * 0.01).collect();
    let line = serde_json::json!({
        "id": "bench-chunk-1",
        "source": "https://docs.example.com/api/issues",
        "text": "The issues endpoint returns a paginated list of issues for the current queue.",
        "embedding": embedding,
    })
    .to_string();

    c.bench_function("parse_line", |b| {
        b.iter(|| {
            parse_line(
                black_box(&line),
                black_box(384),
                black_box(DimensionPolicy::Strict),
            )
        })
    });

    let short: Vec<f32> = (0..300).map(|i| i as f32).collect();
    c.bench_function("normalize_lenient_pad", |b| {
        b.iter(|| {
            normalize_embedding(
                black_box(short.clone()),
                black_box(384),
                black_box(DimensionPolicy::Lenient),
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
