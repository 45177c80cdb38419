//! Runtime adapters for spawned execution.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
