use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::options::duration_string;

/// A health check definition, as embedded in service and check
/// registrations.
///
/// Build one with [`Check::http`], [`Check::tcp`], [`Check::ttl`],
/// [`Check::script`] or [`Check::grpc`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Check {
    #[serde(rename = "HTTP", skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub header: HashMap<String, Vec<String>>,

    #[serde(rename = "TLSSkipVerify", skip_serializing_if = "Option::is_none")]
    pub tls_skip_verify: Option<bool>,

    #[serde(rename = "TCP", skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,

    #[serde(rename = "GRPC", skip_serializing_if = "Option::is_none")]
    pub grpc: Option<String>,

    #[serde(rename = "GRPCUseTLS", skip_serializing_if = "Option::is_none")]
    pub grpc_use_tls: Option<bool>,

    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,

    /// Script command and arguments
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deregister_critical_service_after: Option<String>,
}

impl Check {
    /// GET `url` every `interval`; any 2xx is passing.
    pub fn http(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            http: Some(url.into()),
            interval: Some(duration_string(interval)),
            ..Default::default()
        }
    }

    /// Connect to `host:port` every `interval`.
    pub fn tcp(host: &str, port: u16, interval: Duration) -> Self {
        Self {
            tcp: Some(format!("{}:{}", host, port)),
            interval: Some(duration_string(interval)),
            ..Default::default()
        }
    }

    /// Passing only while the service reports in at least every `ttl`.
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(duration_string(ttl)),
            ..Default::default()
        }
    }

    /// Run a command every `interval`; the exit code decides the state.
    pub fn script<I, S>(args: I, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            interval: Some(duration_string(interval)),
            ..Default::default()
        }
    }

    /// gRPC health protocol against `address` every `interval`.
    pub fn grpc(address: impl Into<String>, interval: Duration, use_tls: bool) -> Self {
        Self {
            grpc: Some(address.into()),
            grpc_use_tls: Some(use_tls),
            interval: Some(duration_string(interval)),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(duration_string(timeout));
        self
    }

    /// Deregister the service after it has been critical for `after`.
    pub fn deregister_critical_after(mut self, after: Duration) -> Self {
        self.deregister_critical_service_after = Some(duration_string(after));
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_tls_skip_verify(mut self, skip: bool) -> Self {
        self.tls_skip_verify = Some(skip);
        self
    }
}
