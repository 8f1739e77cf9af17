//! # consul
//!
//! Client for the Consul HTTP API, usable from blocking code, from an async
//! runtime, or through callbacks driven by a client-owned event loop.
//!
//! Every endpoint is written once. It builds an [`ApiCall`] (a request plus
//! the decoder for its response) and hands it to the client's [`Dispatch`]
//! implementation, which decides what the caller gets back.
//!
//! ```ignore
//! use consul::{Consul, ConsulConfig, QueryOptions};
//!
//! // Result<T, Error>
//! let consul = Consul::blocking(ConsulConfig::from_env()?)?;
//! let leader = consul.status().leader()?;
//!
//! // impl Future<Output = Result<T, Error>>
//! let consul = Consul::asynchronous(ConsulConfig::from_env()?)?;
//! let entry = consul.kv().get("app/mode", &QueryOptions::new()).await?;
//!
//! // Pending<T>
//! let consul = Consul::callback(ConsulConfig::from_env()?)?;
//! consul.status().peers().on_complete(|peers| println!("{:?}", peers));
//! ```
//!
//! Reads that support blocking queries return [`Indexed`] values; pass the
//! index back through [`QueryOptions::blocking`] to wait for a change.

pub mod api;
pub mod call;
pub mod client;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod options;
pub mod pending;

pub use api::{
    AgentCheckRegistration, AgentService, AgentServiceRegistration, CatalogDeregistration,
    CatalogRegistration, CatalogService, Check, CheckState, HealthCheck, HealthServiceOptions,
    KvDeleteOptions, KvPair, KvPutOptions, Member, Node, NodeServices, ServiceEntry,
    SessionBehavior, SessionInfo, SessionRequest,
};
pub use call::ApiCall;
pub use client::Consul;
pub use config::{Consistency, ConsulConfig};
pub use decode::Indexed;
pub use dispatch::{Async, Blocking, CallFuture, Callback, Dispatch};
pub use error::Error;
pub use options::{QueryOptions, WriteOptions};
pub use pending::Pending;
