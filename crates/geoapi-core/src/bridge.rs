//! Running synchronous business logic from an async runtime.
//!
//! Handlers are plain functions that may block (database drivers, file
//! reads, remote providers). On the async backend they run on tokio's
//! blocking pool so the runtime threads keep serving other requests while
//! a handler works. Request normalization and the format check stay on the
//! runtime thread; they never block.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::runtime::Handle;
use tracing::error;

use crate::api::{check_format, finish, record_request, Api, ExecuteOptions, Handler};
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::rules::Backend;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The runtime shut down before the blocking task completed.
    #[error("blocking task was cancelled")]
    Cancelled,
}

/// Run `f` on a blocking worker thread and await its result.
///
/// The worker enters the runtime of the caller, so `f` can spawn tasks or
/// use `Handle::current()`. A panic in `f` resumes on the awaiting task.
pub async fn run_blocking<F, T>(f: F) -> Result<T, BridgeError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = Handle::current();
    let task = tokio::task::spawn_blocking(move || {
        let _guard = handle.enter();
        f()
    });

    match task.await {
        Ok(value) => Ok(value),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            error!(error = %e, "Blocking task did not complete");
            Err(BridgeError::Cancelled)
        }
    }
}

/// Async counterpart of [`crate::api::execute`].
///
/// The format check runs inline; the handler runs through [`run_blocking`];
/// gzip is applied to whichever response results.
pub async fn execute_async<H>(
    api: Arc<Api>,
    handler: H,
    request: ApiRequest,
    args: Vec<String>,
    options: ExecuteOptions,
    backend: Backend,
) -> anyhow::Result<ApiResponse>
where
    H: Handler,
{
    let started = Instant::now();

    let response = match check_format(&api, &request, &options, backend) {
        Some(rejection) => rejection,
        None => {
            let api = Arc::clone(&api);
            run_blocking(move || handler.call(&api, &request, &args)).await??
        }
    };

    record_request(backend, started);
    Ok(finish(response))
}
