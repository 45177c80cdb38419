//! Tests for runtime adapters

use bounded_runner::core::Spawn;
use bounded_runner::runtime::TokioSpawner;

#[test]
fn test_tokio_spawner_from_runtime_handle() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let spawner = TokioSpawner::new(runtime.handle().clone());

    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send("spawned").unwrap();
    });
    assert_eq!(rx.recv().unwrap(), "spawned");
}
