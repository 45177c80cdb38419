//! Benchmarks for bounded task execution.
//!
//! Benchmarks cover:
//! - `run_bounded` admission overhead with immediately ready tasks
//! - `TaskRunner` with accounting and an active task policy
//! - `SpawnedRunner` on a multi-threaded runtime

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use async_trait::async_trait;
use bounded_runner::core::TaskExecutor;
use bounded_runner::runtime::TokioSpawner;
use bounded_runner::{run_bounded, SpawnedRunner, TaskPolicy, TaskRunner};
use tokio::runtime::Runtime;

// ============================================================================
// Test Executor
// ============================================================================

#[derive(Clone)]
struct BenchExecutor;

#[async_trait]
impl TaskExecutor<u64, String, String> for BenchExecutor {
    async fn execute(&self, payload: u64) -> Result<String, String> {
        Ok(format!("result-{payload}"))
    }
}

// ============================================================================
// run_bounded Benchmarks
// ============================================================================

fn bench_run_bounded_ready(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_bounded_ready");

    for limit in [1_usize, 8, 64] {
        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let tasks = (0..1_000_u64).map(|i| move || async move { Ok::<_, String>(i) });
                let outcomes = run_bounded(tasks, limit).await.unwrap();
                black_box(outcomes);
            });
        });
    }
    group.finish();
}

fn bench_run_bounded_yielding(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_bounded_yielding");

    for limit in [4_usize, 32] {
        group.throughput(Throughput::Elements(500));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let tasks = (0..500_u64).map(|i| {
                    move || async move {
                        tokio::task::yield_now().await;
                        Ok::<_, String>(i)
                    }
                });
                black_box(run_bounded(tasks, limit).await.unwrap());
            });
        });
    }
    group.finish();
}

// ============================================================================
// TaskRunner Benchmarks
// ============================================================================

fn bench_task_runner_with_policy(c: &mut Criterion) {
    let runner = TaskRunner::with_limit(16)
        .unwrap()
        .with_policy(TaskPolicy::new().with_task_timeout(Duration::from_secs(1)));

    c.bench_function("task_runner_with_policy", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| async {
            let tasks = (0..500_u64).map(|i| move || async move { Ok::<_, String>(i * 2) });
            black_box(runner.run(tasks).await);
        });
    });
}

fn bench_task_runner_payloads(c: &mut Criterion) {
    let runner = TaskRunner::with_limit(16).unwrap();

    c.bench_function("task_runner_payloads", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| async {
            black_box(runner.run_payloads(0..500_u64, &BenchExecutor).await);
        });
    });
}

// ============================================================================
// SpawnedRunner Benchmarks
// ============================================================================

fn bench_spawned_runner(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let runner = SpawnedRunner::new(16, TokioSpawner::new(rt.handle().clone())).unwrap();

    c.bench_function("spawned_runner", |b| {
        b.to_async(&rt).iter(|| async {
            let tasks = (0..500_u64).map(|i| move || async move { Ok::<_, String>(i) });
            black_box(runner.run(tasks).await);
        });
    });
}

criterion_group!(
    bounded_benches,
    bench_run_bounded_ready,
    bench_run_bounded_yielding
);

criterion_group!(
    runner_benches,
    bench_task_runner_with_policy,
    bench_task_runner_payloads,
    bench_spawned_runner
);

criterion_main!(bounded_benches, runner_benches);
