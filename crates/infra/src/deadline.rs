use std::future::Future;
use std::time::Duration;

/// Run `fut`, mapping an elapsed `limit` to the error built by `on_timeout`.
pub(crate) async fn within<T, E, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce() -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
