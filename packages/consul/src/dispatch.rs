//! Running calls on an adapter.
//!
//! The API is written once against [`Dispatch`]; the adapter decides what a
//! call returns:
//!
//! | dispatcher    | `Output<T>`         |
//! |---------------|---------------------|
//! | [`Blocking`]  | `Result<T, Error>`  |
//! | [`Async`]     | [`CallFuture<T>`]   |
//! | [`Callback`]  | [`Pending<T>`]      |

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use consul_http::{asynchronous, blocking, callback, AsyncHttpExecutor, HttpExecutor};

use crate::call::ApiCall;
use crate::error::Error;
use crate::pending::{Pending, Slot};

/// Future returned by the async adapter.
pub type CallFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'static>>;

pub trait Dispatch {
    type Output<T: Send + 'static>;

    fn dispatch<T: Send + 'static>(&self, call: ApiCall<T>) -> Self::Output<T>;
}

/// Calls run on the calling thread.
pub struct Blocking<E = blocking::HttpClient> {
    executor: E,
}

impl<E: HttpExecutor> Blocking<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: HttpExecutor> Dispatch for Blocking<E> {
    type Output<T: Send + 'static> = Result<T, Error>;

    fn dispatch<T: Send + 'static>(&self, call: ApiCall<T>) -> Result<T, Error> {
        let (request, decode) = call.into_parts();
        let response = self.executor.execute(&request?)?;
        decode(response)
    }
}

/// Calls return futures for the caller's runtime.
///
/// The request starts when the future is first polled.
pub struct Async<E = asynchronous::HttpClient> {
    executor: Arc<E>,
}

impl<E: AsyncHttpExecutor + 'static> Async<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: AsyncHttpExecutor + 'static> Dispatch for Async<E> {
    type Output<T: Send + 'static> = CallFuture<T>;

    fn dispatch<T: Send + 'static>(&self, call: ApiCall<T>) -> CallFuture<T> {
        let executor = Arc::clone(&self.executor);
        let (request, decode) = call.into_parts();

        Box::pin(async move {
            let response = executor.execute(request?).await?;
            decode(response)
        })
    }
}

/// Calls run on the adapter's event loop and complete through [`Pending`].
pub struct Callback<E = asynchronous::HttpClient> {
    client: callback::HttpClient<E>,
}

impl<E: AsyncHttpExecutor + 'static> Callback<E> {
    pub fn new(client: callback::HttpClient<E>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &callback::HttpClient<E> {
        &self.client
    }
}

impl<E: AsyncHttpExecutor + 'static> Dispatch for Callback<E> {
    type Output<T: Send + 'static> = Pending<T>;

    fn dispatch<T: Send + 'static>(&self, call: ApiCall<T>) -> Pending<T> {
        let slot = Slot::new();
        let (request, decode) = call.into_parts();

        let handle = match request {
            Ok(request) => {
                let completer = Arc::clone(&slot);
                self.client.fetch(request, move |result| {
                    completer.fill(result.map_err(Error::from).and_then(decode));
                })
            }
            Err(error) => {
                let handle = self.client.reject(error.to_string());
                slot.fill(Err(error));
                handle
            }
        };

        Pending::new(slot, handle)
    }
}
