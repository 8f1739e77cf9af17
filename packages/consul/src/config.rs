use serde::{Deserialize, Serialize};

use consul_http::ClientConfig;

use crate::error::Error;

pub const ENV_HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";

/// Read consistency mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// Leader answers, may be stale briefly after an election
    #[default]
    Default,
    /// Leader verifies it still holds leadership before answering
    Consistent,
    /// Any server answers
    Stale,
}

impl Consistency {
    /// Query flag carried by the request, if any.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            Consistency::Default => None,
            Consistency::Consistent => Some("consistent"),
            Consistency::Stale => Some("stale"),
        }
    }
}

/// Client-wide settings: where the agent is plus the defaults applied to
/// every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsulConfig {
    #[serde(flatten)]
    pub http: ClientConfig,

    /// ACL token sent as `X-Consul-Token`
    pub token: Option<String>,

    /// Datacenter sent as `dc`
    pub dc: Option<String>,

    pub consistency: Consistency,
}

impl ConsulConfig {
    pub fn new(http: ClientConfig) -> Self {
        Self {
            http,
            ..Default::default()
        }
    }

    /// Defaults overlaid with the `CONSUL_HTTP_*` environment variables,
    /// including `CONSUL_HTTP_TOKEN`.
    pub fn from_env() -> Result<Self, Error> {
        Self::with_env_lookup(|name| std::env::var(name).ok())
    }

    pub fn with_env_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_HTTP_TOKEN).filter(|token| !token.is_empty());
        let http = ClientConfig::default().with_env_lookup(lookup)?;

        Ok(Self {
            http,
            token,
            ..Default::default()
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_dc(mut self, dc: impl Into<String>) -> Self {
        self.dc = Some(dc.into());
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }
}
