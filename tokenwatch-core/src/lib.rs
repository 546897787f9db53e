//! tokenwatch-core
//!
//! Merge/normalization logic and stream-lifecycle primitives shared by the
//! Scheduler and Broadcaster.
//!
//! - `merge`: the Normalizer/Validator and field-precedence Merger.
//! - `stream`: `StreamHandle`, the graceful-stop-then-abort task handle used
//!   by any long-lived background loop (the Scheduler's ticker, the
//!   Broadcaster's delivery loop).
#![warn(missing_docs)]

/// Normalizer/Validator and field-precedence Merger.
pub mod merge;
/// Internal stream utilities used by `StreamHandle` and tests.
pub mod stream;

/// Minimal stream handle abstraction for long-lived streaming tasks.
///
/// Lifecycle contract:
/// - Prefer calling [`stop`](StreamHandle::stop) to request a graceful shutdown and await completion.
/// - Call [`abort`](StreamHandle::abort) for immediate, non-graceful termination.
/// - If dropped without an explicit shutdown, a best-effort stop signal is sent (if available) and
///   the underlying task is then aborted. The task may not observe the stop signal before abort.
#[derive(Debug)]
pub struct StreamHandle {
    inner: Option<tokio::task::JoinHandle<()>>,
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl StreamHandle {
    /// Create a new `StreamHandle`.
    ///
    /// Parameters:
    /// - `inner`: the spawned task driving the stream.
    /// - `stop_tx`: a one-shot used to request a graceful stop.
    ///
    /// Returns a handle that can be used to stop or abort the stream.
    #[must_use]
    pub const fn new(
        inner: tokio::task::JoinHandle<()>,
        stop_tx: tokio::sync::oneshot::Sender<()>,
    ) -> Self {
        Self {
            inner: Some(inner),
            stop_tx: Some(stop_tx),
        }
    }

    /// Create a `StreamHandle` that can only abort the task (no graceful stop).
    ///
    /// This constructor is intended for loops that do not support a
    /// cooperative shutdown signal. Dropping the handle (or calling
    /// [`abort`](Self::abort)) will force-cancel the underlying task.
    #[must_use]
    pub const fn new_abort_only(inner: tokio::task::JoinHandle<()>) -> Self {
        Self {
            inner: Some(inner),
            stop_tx: None,
        }
    }

    /// Gracefully stop the underlying task and await its completion.
    ///
    /// Sends a stop signal if available, then awaits the task. Any errors
    /// from the task are ignored.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(inner) = self.inner.take() {
            let _ = inner.await;
        }
    }

    /// Force-abort the underlying task without waiting for completion.
    ///
    /// Prefer [`stop`](Self::stop) when possible to allow cleanup.
    pub fn abort(mut self) {
        if let Some(inner) = self.inner.take() {
            inner.abort();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        crate::stream::drop_impl(&mut self.inner, &mut self.stop_tx);
    }
}

pub use merge::{merge, normalize};
