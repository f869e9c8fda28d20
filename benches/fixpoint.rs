//! Performance benchmarks for fixpoint loops on the in-memory store.
//!
//! Run with: `cargo bench --bench fixpoint`
//!
//! Every pass re-evaluates the rule over the whole graph, so a chain of depth
//! d costs d + 1 passes. These benches track how that scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use route_inference::{
    Class, FixpointRule, FixpointRunner, InMemoryGraphStore, InferenceConfig, Orchestrator,
    Predicate, Triple,
};

/// Nested route chain of the given depth with a duration on every element.
fn make_chain(depth: usize) -> Vec<Triple> {
    let mut triples = Vec::with_capacity(depth * 6 + 1);
    for i in 1..=depth {
        let route = format!("route_{i}");
        let run = format!("run_{i}");
        let next = if i == depth { "tail".to_string() } else { format!("route_{}", i + 1) };
        triples.push(Triple::typed(route.as_str(), Class::Route));
        triples.push(Triple::link(route.as_str(), Predicate::FirstElement, run.as_str()));
        triples.push(Triple::link(route.as_str(), Predicate::NextElement, next));
        triples.push(Triple::typed(run.as_str(), if i % 2 == 0 { Class::RedRun } else { Class::BlueRun }));
        triples.push(Triple::literal(run, Predicate::Duration, i as i64));
    }
    triples.push(Triple::literal("tail", Predicate::Duration, 1));
    triples
}

/// Benchmark the duration fixpoint alone.
fn bench_duration_fixpoint(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("duration_fixpoint");

    for depth in [4usize, 16, 64] {
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.to_async(&rt).iter(|| async move {
                let store = Arc::new(InMemoryGraphStore::from_triples(make_chain(depth)));
                let runner = FixpointRunner::new(store, InferenceConfig::unbounded());
                black_box(runner.run_to_fixpoint(&FixpointRule::DURATION).await.expect("fixpoint"))
            });
        });
    }

    group.finish();
}

/// Benchmark a full orchestrated run.
fn bench_full_run(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("full_run");

    for depth in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.to_async(&rt).iter(|| async move {
                let store = Arc::new(InMemoryGraphStore::from_triples(make_chain(depth)));
                let orchestrator = Orchestrator::new(store, InferenceConfig::unbounded());
                black_box(orchestrator.run().await.expect("run"))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_duration_fixpoint, bench_full_run);
criterion_main!(benches);
