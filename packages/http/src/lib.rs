//! # consul-http
//!
//! HTTP transport for the Consul client.
//!
//! Requests are described once as an [`HttpRequest`] (method, agent path,
//! query parameters, body) and every adapter answers with the same
//! normalized [`HttpResponse`] (status code, headers, body text).
//!
//! ## Adapters
//!
//! ### blocking::HttpClient
//!
//! Synchronous requests on the calling thread:
//!
//! ```ignore
//! use consul_http::{blocking, ClientConfig, HttpExecutor, Params};
//!
//! let client = blocking::HttpClient::new(ClientConfig::from_env()?)?;
//! let response = client.get("/v1/status/leader", Params::new())?;
//! ```
//!
//! ### asynchronous::HttpClient
//!
//! `async` requests on the caller's runtime:
//!
//! ```ignore
//! use consul_http::{asynchronous, AsyncHttpExecutor};
//!
//! let client = asynchronous::HttpClient::new(ClientConfig::default())?;
//! let response = client.get("/v1/status/peers", Params::new()).await?;
//! client.close();
//! ```
//!
//! ### callback::HttpClient
//!
//! Requests on a client-owned event loop, completion delivered to a callback:
//!
//! ```ignore
//! use consul_http::callback;
//!
//! let client = callback::HttpClient::new(ClientConfig::default())?;
//! let handle = client.get("/v1/agent/self", Params::new(), |result| {
//!     // runs on the event loop
//! });
//! handle.wait();
//! ```

pub mod asynchronous;
pub mod blocking;
pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod handle;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::{ClientCert, ClientConfig};
pub use error::Error;
pub use executor::{AsyncHttpExecutor, HttpExecutor};
pub use handle::{RequestHandle, RequestState, RequestStatus};
pub use types::{HttpRequest, HttpResponse, Method, Params, RequestTimeout};
