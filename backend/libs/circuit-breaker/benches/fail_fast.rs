//! Circuit breaker overhead
//!
//! 1. Closed path: admission + success bookkeeping around a no-op call
//! 2. Open path: rejection without touching the dependency
//! 3. Contended Closed path across many tasks
//!
//! Run: cargo bench -p circuit-breaker --bench fail_fast

use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn benchmark_closed_path(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cb = CircuitBreaker::new(CircuitBreakerConfig::named("bench-closed")).unwrap();

    let cb = &cb;

    c.bench_function("execute_closed", |b| {
        b.to_async(&rt).iter(|| async move {
            let _ = cb
                .execute(|| async { Ok::<_, String>(black_box(1u64)) })
                .await;
        });
    });
}

fn benchmark_open_path(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cb = CircuitBreaker::new(
        CircuitBreakerConfig::named("bench-open")
            .with_failure_threshold(1)
            .with_reset_timeout(Duration::from_secs(3600)),
    )
    .unwrap();
    let _ = rt.block_on(cb.execute(|| async { Err::<(), _>("down") }));

    let cb = &cb;

    c.bench_function("execute_open_rejected", |b| {
        b.to_async(&rt).iter(|| async move {
            let result = cb.execute(|| async { Ok::<_, String>(()) }).await;
            black_box(result.is_err())
        });
    });
}

fn benchmark_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    for concurrency in [10, 100] {
        group.bench_with_input(
            BenchmarkId::new("execute_closed", concurrency),
            &concurrency,
            |b, &concurrency| {
                let rt = Runtime::new().unwrap();
                let cb = Arc::new(
                    CircuitBreaker::new(CircuitBreakerConfig::named("bench-contended")).unwrap(),
                );
                b.to_async(&rt).iter(|| {
                    let cb = cb.clone();
                    async move {
                        let handles: Vec<_> = (0..concurrency)
                            .map(|_| {
                                let cb = cb.clone();
                                tokio::spawn(async move {
                                    cb.execute(|| async { Ok::<_, String>(()) }).await
                                })
                            })
                            .collect();
                        for handle in handles {
                            let _ = handle.await;
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_closed_path,
    benchmark_open_path,
    benchmark_contended
);
criterion_main!(benches);
