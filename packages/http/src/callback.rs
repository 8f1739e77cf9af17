//! Callback adapter.
//!
//! The client owns its own event loop. Starting a request returns a
//! [`RequestHandle`] right away; the caller's callback receives the
//! normalized response on the loop once the request finishes.
//!
//! # Usage Model
//!
//! ```text
//! 1. Start a request:
//!    fetch(request, callback) -> RequestHandle
//!
//! 2. Query status (non-blocking):
//!    handle.status() -> RequestStatus { state: pending|complete|failed, ... }
//!
//! 3. Block until the callback has run:
//!    handle.wait()
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};

use crate::asynchronous;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::executor::AsyncHttpExecutor;
use crate::handle::RequestHandle;
use crate::types::{HttpRequest, HttpResponse, Params};

/// Callback adapter running requests on an owned event loop.
pub struct HttpClient<E = asynchronous::HttpClient> {
    executor: Arc<E>,
    handle: Handle,
    runtime: Option<Runtime>,
    next_id: AtomicU64,
}

impl HttpClient<asynchronous::HttpClient> {
    /// Create a callback client for the configured agent
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        Self::with_executor(asynchronous::HttpClient::new(config)?)
    }
}

impl<E: AsyncHttpExecutor + 'static> HttpClient<E> {
    /// Run requests through a custom executor
    pub fn with_executor(executor: E) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("consul-callback")
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime {
                message: format!("Failed to create event loop: {}", e),
            })?;

        Ok(Self {
            executor: Arc::new(executor),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Generate a unique request ID
    fn generate_id(&self) -> String {
        format!("{:016x}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Start `request` and return immediately.
    ///
    /// `on_complete` runs on the event loop before the handle leaves the
    /// pending state, so [`RequestHandle::wait`] returning means the callback
    /// has finished.
    pub fn fetch<F>(&self, request: HttpRequest, on_complete: F) -> RequestHandle
    where
        F: FnOnce(Result<HttpResponse, Error>) + Send + 'static,
    {
        let handle = RequestHandle::new(self.generate_id());
        let executor = Arc::clone(&self.executor);

        tracing::debug!(id = %handle.id(), method = %request.method, path = %request.path, "starting request");

        let mut completion = Completion::new(handle.clone(), on_complete);

        let _task = self.handle.spawn(async move {
            let result = executor.execute(request).await;
            completion.finish(result);
        });

        handle
    }

    /// Handle for a request that failed before it could be started.
    pub fn reject(&self, error: impl Into<String>) -> RequestHandle {
        let handle = RequestHandle::new(self.generate_id());
        handle.fail(error.into());
        handle
    }

    pub fn get<F>(&self, path: &str, params: Params, on_complete: F) -> RequestHandle
    where
        F: FnOnce(Result<HttpResponse, Error>) + Send + 'static,
    {
        self.fetch(HttpRequest::get(path).with_params(params), on_complete)
    }

    pub fn put<F>(
        &self,
        path: &str,
        params: Params,
        body: Vec<u8>,
        on_complete: F,
    ) -> RequestHandle
    where
        F: FnOnce(Result<HttpResponse, Error>) + Send + 'static,
    {
        self.fetch(
            HttpRequest::put(path).with_params(params).with_body(body),
            on_complete,
        )
    }

    pub fn post<F>(
        &self,
        path: &str,
        params: Params,
        body: Vec<u8>,
        on_complete: F,
    ) -> RequestHandle
    where
        F: FnOnce(Result<HttpResponse, Error>) + Send + 'static,
    {
        self.fetch(
            HttpRequest::post(path).with_params(params).with_body(body),
            on_complete,
        )
    }

    pub fn delete<F>(&self, path: &str, params: Params, on_complete: F) -> RequestHandle
    where
        F: FnOnce(Result<HttpResponse, Error>) + Send + 'static,
    {
        self.fetch(HttpRequest::delete(path).with_params(params), on_complete)
    }
}

/// Delivers the outcome of one request to its callback and handle.
///
/// If the task is dropped before a response arrives (the event loop shut
/// down), the callback receives [`Error::Closed`] and the handle fails.
struct Completion<F>
where
    F: FnOnce(Result<HttpResponse, Error>),
{
    handle: RequestHandle,
    on_complete: Option<F>,
}

impl<F> Completion<F>
where
    F: FnOnce(Result<HttpResponse, Error>),
{
    fn new(handle: RequestHandle, on_complete: F) -> Self {
        Self {
            handle,
            on_complete: Some(on_complete),
        }
    }

    fn finish(&mut self, result: Result<HttpResponse, Error>) {
        let Some(on_complete) = self.on_complete.take() else {
            return;
        };
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());

        match run_callback(on_complete, result) {
            Err(panicked) => self.handle.fail(panicked),
            Ok(()) => match outcome {
                Ok(()) => self.handle.complete(),
                Err(error) => self.handle.fail(error),
            },
        }
    }
}

impl<F> Drop for Completion<F>
where
    F: FnOnce(Result<HttpResponse, Error>),
{
    fn drop(&mut self) {
        if self.on_complete.is_some() {
            tracing::debug!(id = %self.handle.id(), "request dropped by event loop shutdown");
            self.finish(Err(Error::Closed));
        }
    }
}

/// Run the caller's callback, turning a panic into an error message.
fn run_callback<F>(on_complete: F, result: Result<HttpResponse, Error>) -> Result<(), String>
where
    F: FnOnce(Result<HttpResponse, Error>),
{
    panic::catch_unwind(AssertUnwindSafe(|| on_complete(result))).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!(%message, "request callback panicked");
        format!("callback panicked: {}", message)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

impl<E> Drop for HttpClient<E> {
    fn drop(&mut self) {
        // Dropping a runtime in place panics inside async contexts.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
