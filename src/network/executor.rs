//! Executor - runs requests and folds every outcome into a `ResponseResult`
//!
//! Nothing raised while building or sending escapes this module. Build
//! failures, transport failures and timeouts all come back as results with
//! `status_code == 0` and a readable message in `text_body`; responses from
//! a server, 4xx and 5xx included, come back with their real status.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::constants::{BUILD_ERROR_PREFIX, CANCELLED_MESSAGE, DEFAULT_TIMEOUT_SECS, ERROR_PREFIX};
use crate::models::{RequestSpec, ResponseResult};
use crate::network::builder::build_request;
use crate::network::transport::{RawResponse, TransportClient};

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl RawResponse {
    /// Wrap a wire response; the body is decoded lossily so this never fails.
    pub fn into_result(self, duration_ms: u64) -> ResponseResult {
        ResponseResult {
            status_code: self.status,
            text_body: String::from_utf8_lossy(&self.body).into_owned(),
            raw_body: self.body,
            headers: self.headers,
            duration_ms,
        }
    }
}

/// Runs requests on a tokio runtime against a shared transport
#[derive(Clone)]
pub struct Executor {
    transport: Arc<TransportClient>,
    runtime: Handle,
    default_timeout_secs: u64,
}

impl Executor {
    /// `runtime` is where `execute_async` spawns its work.
    pub fn new(transport: Arc<TransportClient>, runtime: Handle) -> Self {
        Executor {
            transport,
            runtime,
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Deadline applied when a spec's timeout is zero or negative.
    pub fn with_default_timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs.max(1);
        self
    }

    pub fn transport(&self) -> &Arc<TransportClient> {
        &self.transport
    }

    /// Start `spec` and return at once. The returned handle resolves to the
    /// result; dropping it does not stop the request.
    pub fn execute_async(&self, spec: RequestSpec) -> ResponseHandle {
        let (tx, rx) = oneshot::channel();
        let executor = self.clone();
        let task = self.runtime.spawn(async move {
            let result = executor.run(&spec).await;
            let _ = tx.send(result);
        });

        ResponseHandle {
            rx,
            abort: task.abort_handle(),
            started: Instant::now(),
            cancelled: false,
        }
    }

    /// Blocking convenience over `execute_async`.
    ///
    /// From a plain thread this just waits. Inside a multi-thread runtime the
    /// worker is handed over with `block_in_place` first; a current-thread
    /// runtime cannot be blocked at all, so the call resolves to an error
    /// result without starting the request.
    pub fn execute(&self, spec: RequestSpec) -> ResponseResult {
        match Handle::try_current().map(|h| h.runtime_flavor()) {
            Err(_) => self.execute_async(spec).wait(),
            Ok(RuntimeFlavor::CurrentThread) => {
                tracing::warn!(url = %spec.url, "Blocking execute on a current-thread runtime");
                ResponseResult::failure(
                    format!(
                        "{}blocking execute is not available on a current-thread runtime, use execute_async",
                        ERROR_PREFIX
                    ),
                    0,
                )
            }
            Ok(_) => {
                let handle = self.execute_async(spec);
                tokio::task::block_in_place(|| handle.wait())
            }
        }
    }

    /// Build, send under the spec's deadline and normalize the outcome on
    /// the current task.
    pub async fn run(&self, spec: &RequestSpec) -> ResponseResult {
        let start = Instant::now();
        let timeout_secs = spec.effective_timeout_secs(self.default_timeout_secs);
        tracing::info!(method = spec.method.as_str(), url = %spec.url, timeout_secs, "Executing request");

        let wire = match build_request(spec) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::warn!(url = %spec.url, error = %e, "Request could not be built");
                return ResponseResult::failure(
                    format!("{}{}", BUILD_ERROR_PREFIX, e),
                    elapsed_ms(start),
                );
            }
        };

        let result = match self
            .transport
            .send(wire, Duration::from_secs(timeout_secs))
            .await
        {
            Ok(raw) => raw.into_result(elapsed_ms(start)),
            Err(e) => {
                tracing::warn!(url = %spec.url, error = %e, timeout = e.is_timeout(), "Request failed");
                ResponseResult::failure(format!("{}{}", ERROR_PREFIX, e), elapsed_ms(start))
            }
        };

        tracing::info!(
            url = %spec.url,
            status = result.status_code,
            duration_ms = result.duration_ms,
            bytes = result.raw_body.len(),
            "Request completed"
        );
        result
    }
}

/// Pending result of `Executor::execute_async`
pub struct ResponseHandle {
    rx: oneshot::Receiver<ResponseResult>,
    abort: AbortHandle,
    started: Instant,
    cancelled: bool,
}

impl ResponseHandle {
    /// Abort this request only. If it already finished, the real result is
    /// still returned.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.abort.abort();
    }

    /// Block the current thread until the result is available.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context;
    /// `Executor::execute` guards against that.
    pub fn wait(self) -> ResponseResult {
        let ResponseHandle {
            rx,
            started,
            cancelled,
            ..
        } = self;
        match rx.blocking_recv() {
            Ok(result) => result,
            Err(_) => lost(cancelled, started),
        }
    }
}

/// Result for a task that ended without sending one.
fn lost(cancelled: bool, started: Instant) -> ResponseResult {
    let message = if cancelled {
        CANCELLED_MESSAGE.to_string()
    } else {
        format!("{}request task terminated unexpectedly", ERROR_PREFIX)
    };
    ResponseResult::failure(message, elapsed_ms(started))
}

impl Future for ResponseHandle {
    type Output = ResponseResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ResponseResult> {
        match self.rx.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(lost(self.cancelled, self.started)),
            Poll::Pending => Poll::Pending,
        }
    }
}
