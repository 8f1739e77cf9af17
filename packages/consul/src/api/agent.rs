use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use consul_http::Method;

use crate::api::check::Check;
use crate::api::health::HealthCheck;
use crate::call::ApiCall;
use crate::client::Consul;
use crate::decode;
use crate::dispatch::Dispatch;

/// A service as the local agent knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,
    pub service: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub meta: HashMap<String, String>,
    pub enable_tag_override: bool,
}

/// A cluster member as seen by the agent's gossip pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Member {
    pub name: String,
    pub addr: String,
    pub port: u16,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub tags: HashMap<String, String>,
    /// Serf status code; 1 is alive
    pub status: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentServiceRegistration {
    pub name: String,
    /// Defaults to `name` on the agent side
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub enable_tag_override: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<Check>,
}

impl AgentServiceRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentCheckRegistration {
    pub name: String,
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
    /// Attach the check to a registered service
    #[serde(rename = "ServiceID", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub check: Check,
}

impl AgentCheckRegistration {
    pub fn new(name: impl Into<String>, check: Check) -> Self {
        Self {
            name: name.into(),
            check,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.check_id = Some(id.into());
        self
    }

    pub fn with_service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// The `/v1/agent` endpoints of the agent the client talks to.
pub struct Agent<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> Agent<'a, D> {
    pub(crate) fn new(consul: &'a Consul<D>) -> Self {
        Self { consul }
    }

    pub fn service(&self) -> AgentServices<'a, D> {
        AgentServices {
            consul: self.consul,
        }
    }

    pub fn check(&self) -> AgentChecks<'a, D> {
        AgentChecks {
            consul: self.consul,
        }
    }

    /// Configuration and member information of the agent.
    pub fn self_info(&self) -> D::Output<serde_json::Value> {
        let request = self.consul.request(Method::GET, "/v1/agent/self", None);
        self.consul
            .dispatch(ApiCall::new(request, decode::json::<serde_json::Value>))
    }

    /// Services registered with the local agent, keyed by service id.
    pub fn services(&self) -> D::Output<HashMap<String, AgentService>> {
        let request = self.consul.request(Method::GET, "/v1/agent/services", None);
        self.consul.dispatch(ApiCall::new(
            request,
            decode::json::<HashMap<String, AgentService>>,
        ))
    }

    /// Checks registered with the local agent, keyed by check id.
    pub fn checks(&self) -> D::Output<HashMap<String, HealthCheck>> {
        let request = self.consul.request(Method::GET, "/v1/agent/checks", None);
        self.consul.dispatch(ApiCall::new(
            request,
            decode::json::<HashMap<String, HealthCheck>>,
        ))
    }

    /// LAN members, or the WAN pool of servers when `wan` is set.
    pub fn members(&self, wan: bool) -> D::Output<Vec<Member>> {
        let mut request = self.consul.request(Method::GET, "/v1/agent/members", None);
        if wan {
            request.params.push("wan", "1");
        }
        self.consul
            .dispatch(ApiCall::new(request, decode::json::<Vec<Member>>))
    }

    /// Ask the agent to join the cluster member at `address`.
    pub fn join(&self, address: &str, wan: bool) -> D::Output<bool> {
        let mut request =
            self.consul
                .request(Method::PUT, &format!("/v1/agent/join/{}", address), None);
        if wan {
            request.params.push("wan", "1");
        }
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }

    /// Move a failed node to the left state.
    pub fn force_leave(&self, node: &str) -> D::Output<bool> {
        let request =
            self.consul
                .request(Method::PUT, &format!("/v1/agent/force-leave/{}", node), None);
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }

    /// Put the whole node into, or take it out of, maintenance mode.
    pub fn maintenance(&self, enable: bool, reason: Option<&str>) -> D::Output<bool> {
        let mut request = self
            .consul
            .request(Method::PUT, "/v1/agent/maintenance", None);
        request.params.push("enable", enable.to_string());
        request.params.push_opt("reason", reason);
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }
}

/// `/v1/agent/service`
pub struct AgentServices<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> AgentServices<'a, D> {
    pub fn register(&self, registration: &AgentServiceRegistration) -> D::Output<bool> {
        let request = self
            .consul
            .request(Method::PUT, "/v1/agent/service/register", None)
            .with_json_body(registration)
            .map_err(Into::into);
        self.consul
            .dispatch(ApiCall::from_result(request, decode::boolean))
    }

    pub fn deregister(&self, service_id: &str) -> D::Output<bool> {
        let request = self.consul.request(
            Method::PUT,
            &format!("/v1/agent/service/deregister/{}", service_id),
            None,
        );
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }

    /// Toggle maintenance mode for one service.
    pub fn maintenance(
        &self,
        service_id: &str,
        enable: bool,
        reason: Option<&str>,
    ) -> D::Output<bool> {
        let mut request = self.consul.request(
            Method::PUT,
            &format!("/v1/agent/service/maintenance/{}", service_id),
            None,
        );
        request.params.push("enable", enable.to_string());
        request.params.push_opt("reason", reason);
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }
}

/// `/v1/agent/check`
pub struct AgentChecks<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> AgentChecks<'a, D> {
    pub fn register(&self, registration: &AgentCheckRegistration) -> D::Output<bool> {
        let request = self
            .consul
            .request(Method::PUT, "/v1/agent/check/register", None)
            .with_json_body(registration)
            .map_err(Into::into);
        self.consul
            .dispatch(ApiCall::from_result(request, decode::boolean))
    }

    pub fn deregister(&self, check_id: &str) -> D::Output<bool> {
        let request = self.consul.request(
            Method::PUT,
            &format!("/v1/agent/check/deregister/{}", check_id),
            None,
        );
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }

    /// Mark a TTL check as passing and reset its timer.
    pub fn ttl_pass(&self, check_id: &str, note: Option<&str>) -> D::Output<bool> {
        self.ttl_update("pass", check_id, note)
    }

    pub fn ttl_warn(&self, check_id: &str, note: Option<&str>) -> D::Output<bool> {
        self.ttl_update("warn", check_id, note)
    }

    pub fn ttl_fail(&self, check_id: &str, note: Option<&str>) -> D::Output<bool> {
        self.ttl_update("fail", check_id, note)
    }

    fn ttl_update(&self, state: &str, check_id: &str, note: Option<&str>) -> D::Output<bool> {
        let mut request = self.consul.request(
            Method::PUT,
            &format!("/v1/agent/check/{}/{}", state, check_id),
            None,
        );
        request.params.push_opt("note", note);
        self.consul.dispatch(ApiCall::new(request, decode::boolean))
    }
}
