//! Endpoint groups of the Consul HTTP API.
//!
//! Each group borrows the [`Consul`](crate::Consul) client and returns
//! whatever its adapter produces for a call.

mod agent;
mod catalog;
mod check;
mod health;
mod kv;
mod session;
mod status;

pub use agent::{
    Agent, AgentCheckRegistration, AgentChecks, AgentService, AgentServiceRegistration,
    AgentServices, Member,
};
pub use catalog::{Catalog, CatalogDeregistration, CatalogRegistration, CatalogService, NodeServices};
pub use check::Check;
pub use health::{CheckState, Health, HealthCheck, HealthServiceOptions, Node, ServiceEntry};
pub use kv::{Kv, KvDeleteOptions, KvPair, KvPutOptions};
pub use session::{Session, SessionBehavior, SessionInfo, SessionRequest};
pub use status::Status;
