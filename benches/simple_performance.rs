use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use smsgate::prelude::*;

fn benchmark_request_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parsing");

    for size in [16, 160, 1600] {
        let input = json!({ "phone": "79990000000", "text": "ы".repeat(size) });
        group.bench_with_input(BenchmarkId::new("parse_valid", size), &input, |b, input| {
            b.iter(|| black_box(SendRequest::parse(input)))
        });
    }

    let rejected = json!({ "phone": "79990000000", "text": 42 });
    group.bench_function("parse_rejected", |b| {
        b.iter(|| black_box(check(&rejected)))
    });

    group.finish();
}

fn benchmark_registry_lookup(c: &mut Criterion) {
    let registry = HandlerRegistry::from_config(&AppConfig::default());
    let mut group = c.benchmark_group("registry");

    group.bench_function("cached_lookup", |b| {
        b.iter(|| black_box(registry.get_handler("post.smsc.ru")))
    });

    group.bench_function("unknown_lookup", |b| {
        b.iter(|| black_box(registry.get_handler("post.unknown.ru")))
    });

    group.bench_function("registry_creation", |b| {
        b.iter(|| black_box(HandlerRegistry::from_config(&AppConfig::default())))
    });

    group.finish();
}

fn benchmark_send_rejected(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = HandlerRegistry::from_config(&AppConfig::default());
    let input = json!({ "phone": "79990000000" });

    c.bench_function("send_rejected_without_network", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(registry.send_message("post.smsc.ru", &input).await) })
    });
}

criterion_group!(
    benches,
    benchmark_request_parsing,
    benchmark_registry_lookup,
    benchmark_send_rejected
);

criterion_main!(benches);
