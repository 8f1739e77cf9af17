use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use consul_http::Method;

use crate::call::ApiCall;
use crate::client::Consul;
use crate::decode::{self, Indexed};
use crate::dispatch::Dispatch;
use crate::error::Error;
use crate::options::{duration_string, QueryOptions, WriteOptions};

const MIN_TTL: Duration = Duration::from_secs(10);
const MAX_TTL: Duration = Duration::from_secs(86400);

/// What happens to locks held by a session when it is invalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBehavior {
    #[default]
    Release,
    Delete,
}

fn duration_opt<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => serializer.serialize_str(&duration_string(*duration)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Defaults to the agent's node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Check ids that invalidate the session; `None` keeps the node's
    /// `serfHealth` default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<String>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration_opt"
    )]
    pub lock_delay: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<SessionBehavior>,
    #[serde(
        rename = "TTL",
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration_opt"
    )]
    pub ttl: Option<Duration>,
}

impl SessionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks = Some(checks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_lock_delay(mut self, delay: Duration) -> Self {
        self.lock_delay = Some(delay);
        self
    }

    pub fn with_behavior(mut self, behavior: SessionBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn validate(&self) -> Result<(), Error> {
        match self.ttl {
            Some(ttl) if !(MIN_TTL..=MAX_TTL).contains(&ttl) => Err(Error::invalid(format!(
                "session ttl must be between 10s and 86400s, got {}",
                duration_string(ttl)
            ))),
            _ => Ok(()),
        }
    }
}

/// A session as reported by the servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SessionInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub node: String,
    #[serde(alias = "NodeChecks", deserialize_with = "decode::null_as_default")]
    pub checks: Vec<String>,
    /// Nanoseconds
    pub lock_delay: u64,
    pub behavior: SessionBehavior,
    #[serde(rename = "TTL")]
    pub ttl: String,
    pub create_index: u64,
    pub modify_index: u64,
}

/// The `/v1/session` endpoints.
pub struct Session<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> Session<'a, D> {
    pub(crate) fn new(consul: &'a Consul<D>) -> Self {
        Self { consul }
    }

    /// Create a session and return its id.
    pub fn create(&self, session: &SessionRequest, options: &WriteOptions) -> D::Output<String> {
        let request = session.validate().and_then(|()| {
            self.consul
                .write_request(Method::PUT, "/v1/session/create", options)
                .with_json_body(session)
                .map_err(Error::from)
        });
        self.consul.dispatch(ApiCall::from_result(request, decode::id))
    }

    /// Destroy a session, releasing or deleting the locks it holds.
    pub fn destroy(&self, session_id: &str, options: &WriteOptions) -> D::Output<bool> {
        let request = self.consul.write_request(
            Method::PUT,
            &format!("/v1/session/destroy/{}", session_id),
            options,
        );
        self.consul
            .dispatch(ApiCall::new(request, decode::json::<bool>))
    }

    /// Every active session in the datacenter.
    pub fn list(&self, options: &QueryOptions) -> D::Output<Indexed<Vec<SessionInfo>>> {
        let request = self
            .consul
            .read_request(Method::GET, "/v1/session/list", options);
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<Vec<SessionInfo>>)
        }))
    }

    /// Active sessions belonging to `node`.
    pub fn node(&self, node: &str, options: &QueryOptions) -> D::Output<Indexed<Vec<SessionInfo>>> {
        let request = self.consul.read_request(
            Method::GET,
            &format!("/v1/session/node/{}", node),
            options,
        );
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<Vec<SessionInfo>>)
        }))
    }

    /// One session; `None` once it no longer exists.
    pub fn info(
        &self,
        session_id: &str,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Option<SessionInfo>>> {
        let request = self.consul.read_request(
            Method::GET,
            &format!("/v1/session/info/{}", session_id),
            options,
        );
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::first::<SessionInfo>)
        }))
    }

    /// Reset the TTL of a session. `None` if the session has expired.
    pub fn renew(&self, session_id: &str, options: &WriteOptions) -> D::Output<Option<SessionInfo>> {
        let request = self.consul.write_request(
            Method::PUT,
            &format!("/v1/session/renew/{}", session_id),
            options,
        );
        self.consul
            .dispatch(ApiCall::new(request, decode::first::<SessionInfo>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body() {
        let request = SessionRequest::new()
            .with_name("leader-lock")
            .with_lock_delay(Duration::from_secs(15))
            .with_behavior(SessionBehavior::Delete)
            .with_ttl(Duration::from_secs(30))
            .with_checks(["serfHealth", "service:web"]);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "Name": "leader-lock",
                "Checks": ["serfHealth", "service:web"],
                "LockDelay": "15s",
                "Behavior": "delete",
                "TTL": "30s"
            })
        );
    }

    #[test]
    fn empty_request_body() {
        assert_eq!(serde_json::to_value(SessionRequest::new()).unwrap(), json!({}));
    }

    #[test]
    fn ttl_bounds() {
        assert!(SessionRequest::new().validate().is_ok());
        assert!(SessionRequest::new()
            .with_ttl(Duration::from_secs(10))
            .validate()
            .is_ok());
        assert!(SessionRequest::new()
            .with_ttl(Duration::from_secs(86400))
            .validate()
            .is_ok());
        assert!(matches!(
            SessionRequest::new()
                .with_ttl(Duration::from_secs(5))
                .validate(),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(SessionRequest::new()
            .with_ttl(Duration::from_secs(86401))
            .validate()
            .is_err());
    }

    #[test]
    fn session_info_decodes() {
        let info: SessionInfo = serde_json::from_value(json!({
            "ID": "adf4238a-882b-9ddc-4a9d-5b6758e4159e",
            "Name": "test-session",
            "Node": "raja-laptop-02",
            "NodeChecks": ["serfHealth"],
            "LockDelay": 15_000_000_000u64,
            "Behavior": "release",
            "TTL": "30s",
            "CreateIndex": 1086449,
            "ModifyIndex": 1086449
        }))
        .unwrap();

        assert_eq!(info.id, "adf4238a-882b-9ddc-4a9d-5b6758e4159e");
        assert_eq!(info.checks, vec!["serfHealth"]);
        assert_eq!(info.behavior, SessionBehavior::Release);
        assert_eq!(info.ttl, "30s");
    }

    #[test]
    fn session_without_checks_decodes() {
        let info: SessionInfo = serde_json::from_value(json!({
            "ID": "adf4238a",
            "Node": "n1",
            "NodeChecks": null,
            "Behavior": "delete"
        }))
        .unwrap();

        assert!(info.checks.is_empty());
        assert_eq!(info.behavior, SessionBehavior::Delete);
    }
}
