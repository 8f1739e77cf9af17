use std::time::Duration;

use parking_lot::Mutex;
use reqwest::blocking::Client;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::executor::{check_timeout, request_body, HttpExecutor};
use crate::types::{HttpRequest, HttpResponse};

/// The HTTP session and the process that created it.
struct Session {
    pid: u32,
    client: Client,
}

/// Synchronous adapter backed by reqwest's blocking client.
///
/// # Example
///
/// ```ignore
/// use consul_http::{blocking::HttpClient, ClientConfig, HttpExecutor, Params};
///
/// let client = HttpClient::new(ClientConfig::default())?;
/// let response = client.get("/v1/status/leader", Params::new())?;
/// ```
pub struct HttpClient {
    config: ClientConfig,
    session: Mutex<Session>,
}

impl HttpClient {
    /// Create a new blocking client for the configured agent
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Self::build_client(&config)?;

        Ok(Self {
            config,
            session: Mutex::new(Session {
                pid: std::process::id(),
                client,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_client(config: &ClientConfig) -> Result<Client, Error> {
        // Deadlines are applied per request.
        let mut builder = Client::builder()
            .timeout(None::<Duration>)
            .danger_accept_invalid_certs(!config.verify);

        if let Some(cert) = &config.cert {
            let identity = reqwest::Identity::from_pem(&cert.load_pem()?)?;
            builder = builder.use_rustls_tls().identity(identity);
        }

        Ok(builder.build()?)
    }

    /// The session to use for the next request, renewed after a fork when
    /// `check_pid` is set.
    fn client(&self) -> Result<Client, Error> {
        let mut session = self.session.lock();

        if self.config.check_pid {
            let pid = std::process::id();
            if pid != session.pid {
                tracing::warn!(
                    old_pid = session.pid,
                    new_pid = pid,
                    "process id changed, starting a new HTTP session"
                );
                session.client = Self::build_client(&self.config)?;
                session.pid = pid;
            }
        }

        Ok(session.client.clone())
    }
}

impl HttpExecutor for HttpClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let url = self.config.uri(&request.path, &request.params)?;
        tracing::debug!(method = %request.method, %url, "sending request");

        let method: http::Method = request.method.into();
        let mut req_builder = self.client()?.request(method, url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = request_body(request) {
            req_builder = req_builder.body(body);
        }

        if let Some(timeout) = request.timeout.resolve(self.config.timeout) {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder.send()?;

        let code = response.status().as_u16();
        let headers = HttpResponse::collect_headers(response.headers());
        let body = String::from_utf8_lossy(&response.bytes()?).into_owned();
        tracing::debug!(code, "received response");

        check_timeout(HttpResponse {
            code,
            headers,
            body,
        })
    }
}
