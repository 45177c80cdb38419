//! Payload executor trait.

use async_trait::async_trait;

/// Abstraction for executing a payload and producing a result.
///
/// An executor is the object-style alternative to passing closures: the
/// runner turns each payload into a task whose body is `execute(payload)`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use bounded_runner::core::TaskExecutor;
///
/// #[derive(Clone)]
/// struct Fetcher { client: reqwest::Client }
///
/// #[async_trait]
/// impl TaskExecutor<String, String, reqwest::Error> for Fetcher {
///     async fn execute(&self, url: String) -> Result<String, reqwest::Error> {
///         self.client.get(url).send().await?.text().await
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor<P, T, E>: Send + Sync + Clone + 'static
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Execute a payload and return its result.
    ///
    /// Called once per attempt; under a retry policy the same payload may be
    /// executed more than once.
    async fn execute(&self, payload: P) -> Result<T, E>;
}
