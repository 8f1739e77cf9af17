//! Connection settings shared by every adapter.
//!
//! Defaults target a local agent (`http://127.0.0.1:8500`). [`ClientConfig::from_env`]
//! applies the standard `CONSUL_HTTP_*` variables on top of them.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::types::Params;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8500;

pub const ENV_HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
pub const ENV_HTTP_SSL: &str = "CONSUL_HTTP_SSL";
pub const ENV_HTTP_SSL_VERIFY: &str = "CONSUL_HTTP_SSL_VERIFY";

/// Client certificate presented to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientCert {
    /// One PEM file holding both certificate and private key
    Pem(PathBuf),
    /// Separate certificate and key PEM files
    Pair { cert: PathBuf, key: PathBuf },
}

impl ClientCert {
    /// Read the PEM material into a single buffer.
    pub fn load_pem(&self) -> Result<Vec<u8>, Error> {
        match self {
            ClientCert::Pem(path) => Ok(std::fs::read(path)?),
            ClientCert::Pair { cert, key } => {
                let mut pem = std::fs::read(cert)?;
                pem.push(b'\n');
                pem.extend(std::fs::read(key)?);
                Ok(pem)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    /// Verify the agent's TLS certificate
    pub verify: bool,
    pub cert: Option<ClientCert>,
    /// Default request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Start a fresh HTTP session when the process id changes
    pub check_pid: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scheme: "http".to_string(),
            verify: true,
            cert: None,
            timeout: None,
            check_pid: false,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Defaults overlaid with `CONSUL_HTTP_ADDR`, `CONSUL_HTTP_SSL` and
    /// `CONSUL_HTTP_SSL_VERIFY`.
    pub fn from_env() -> Result<Self, Error> {
        Self::default().with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.apply_addr(&addr)?;
        }

        if let Some(ssl) = lookup(ENV_HTTP_SSL) {
            self.scheme = if ssl == "true" { "https" } else { "http" }.to_string();
        }

        if let Some(verify) = lookup(ENV_HTTP_SSL_VERIFY) {
            self.verify = verify == "true";
        }

        Ok(self)
    }

    fn apply_addr(&mut self, addr: &str) -> Result<(), Error> {
        let rest = if let Some(rest) = addr.strip_prefix("https://") {
            self.scheme = "https".to_string();
            rest
        } else if let Some(rest) = addr.strip_prefix("http://") {
            self.scheme = "http".to_string();
            rest
        } else {
            addr
        };

        let invalid = || Error::Config {
            message: format!(
                "{} ({}) invalid, does not match <host>:<port>",
                ENV_HTTP_ADDR, addr
            ),
        };

        let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        self.host = host.to_string();
        self.port = port.parse().map_err(|_| invalid())?;
        Ok(())
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_cert(mut self, cert: ClientCert) -> Self {
        self.cert = Some(cert);
        self
    }

    /// A zero timeout disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn with_check_pid(mut self, check_pid: bool) -> Self {
        self.check_pid = check_pid;
        self
    }

    /// `scheme://host:port`
    pub fn base_uri(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Full request URI for an agent path plus query parameters.
    ///
    /// Each path segment is percent-encoded; `/` separates segments and is
    /// kept as-is. `.` and `..` segments are dropped by URL normalization,
    /// so callers building paths from user input must reject them.
    pub fn uri(&self, path: &str, params: &Params) -> Result<Url, Error> {
        let base = self.base_uri();
        let mut url = Url::parse(&base)?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| Error::Config {
                message: format!("{} cannot be used as a base URI", base),
            })?;
            segments.clear();
            for segment in path.trim_start_matches('/').split('/') {
                segments.push(segment);
            }
        }

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }

        Ok(url)
    }
}
