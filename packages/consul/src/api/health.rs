use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use consul_http::Method;

use crate::api::agent::AgentService;
use crate::call::ApiCall;
use crate::client::Consul;
use crate::decode::{self, Indexed};
use crate::dispatch::Dispatch;
use crate::options::QueryOptions;

/// Check states accepted by [`Health::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    Any,
    Passing,
    Warning,
    Critical,
}

impl CheckState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckState::Any => "any",
            CheckState::Passing => "passing",
            CheckState::Warning => "warning",
            CheckState::Critical => "critical",
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A health check and its latest result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthCheck {
    pub node: String,
    #[serde(rename = "CheckID")]
    pub check_id: String,
    pub name: String,
    /// `passing`, `warning` or `critical`
    pub status: String,
    pub notes: String,
    pub output: String,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    pub service_name: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub service_tags: Vec<String>,
}

impl HealthCheck {
    pub fn is_passing(&self) -> bool {
        self.status == CheckState::Passing.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Node {
    #[serde(rename = "ID")]
    pub id: String,
    pub node: String,
    pub address: String,
    pub datacenter: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub tagged_addresses: HashMap<String, String>,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub meta: HashMap<String, String>,
}

/// One instance of a service with its node and checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceEntry {
    pub node: Node,
    pub service: AgentService,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthServiceOptions {
    /// Only instances whose checks are all passing
    pub passing: bool,
    pub tag: Option<String>,
    /// Sort by round trip time from this node; `_agent` for the local agent
    pub near: Option<String>,
    pub node_meta: Vec<(String, String)>,
    pub query: QueryOptions,
}

impl HealthServiceOptions {
    pub fn passing() -> Self {
        Self {
            passing: true,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_near(mut self, near: impl Into<String>) -> Self {
        self.near = Some(near.into());
        self
    }

    pub fn with_node_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_meta.push((key.into(), value.into()));
        self
    }

    pub fn with_query(mut self, query: QueryOptions) -> Self {
        self.query = query;
        self
    }
}

/// The `/v1/health` endpoints.
pub struct Health<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> Health<'a, D> {
    pub(crate) fn new(consul: &'a Consul<D>) -> Self {
        Self { consul }
    }

    /// Instances of `service` with their health checks.
    pub fn service(
        &self,
        service: &str,
        options: &HealthServiceOptions,
    ) -> D::Output<Indexed<Vec<ServiceEntry>>> {
        let mut request = self.consul.read_request(
            Method::GET,
            &format!("/v1/health/service/{}", service),
            &options.query,
        );
        if options.passing {
            request.params.push("passing", "");
        }
        request.params.push_opt("tag", options.tag.as_ref());
        request.params.push_opt("near", options.near.as_ref());
        for (key, value) in &options.node_meta {
            request.params.push("node-meta", format!("{}:{}", key, value));
        }

        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<Vec<ServiceEntry>>)
        }))
    }

    /// Checks associated with `service`.
    pub fn checks(
        &self,
        service: &str,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Vec<HealthCheck>>> {
        self.indexed_checks(&format!("/v1/health/checks/{}", service), options)
    }

    /// Every check currently in `state`.
    pub fn state(
        &self,
        state: CheckState,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Vec<HealthCheck>>> {
        self.indexed_checks(&format!("/v1/health/state/{}", state), options)
    }

    /// Checks registered on `node`.
    pub fn node(&self, node: &str, options: &QueryOptions) -> D::Output<Indexed<Vec<HealthCheck>>> {
        self.indexed_checks(&format!("/v1/health/node/{}", node), options)
    }

    fn indexed_checks(
        &self,
        path: &str,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Vec<HealthCheck>>> {
        let request = self.consul.read_request(Method::GET, path, options);
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<Vec<HealthCheck>>)
        }))
    }
}
