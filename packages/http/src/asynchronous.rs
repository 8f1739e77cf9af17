//! Coroutine adapter: `async` requests on the caller's runtime.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::executor::{check_timeout, request_body, AsyncHttpExecutor};
use crate::types::{HttpRequest, HttpResponse};

/// Asynchronous adapter backed by reqwest's async client.
///
/// Clones share one HTTP session. [`HttpClient::close`] releases it for every
/// clone; requests made afterwards fail with [`Error::Closed`].
#[derive(Clone)]
pub struct HttpClient {
    config: Arc<ClientConfig>,
    session: Arc<RwLock<Option<Client>>>,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!config.verify);

        if let Some(cert) = &config.cert {
            let identity = reqwest::Identity::from_pem(&cert.load_pem()?)?;
            builder = builder.use_rustls_tls().identity(identity);
        }

        Ok(Self {
            config: Arc::new(config),
            session: Arc::new(RwLock::new(Some(builder.build()?))),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Close all pooled connections.
    pub fn close(&self) {
        if self.session.write().take().is_some() {
            tracing::debug!(base_uri = %self.config.base_uri(), "HTTP session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.session.read().is_none()
    }
}

#[async_trait]
impl AsyncHttpExecutor for HttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let client = self.session.read().clone().ok_or(Error::Closed)?;

        let url = self.config.uri(&request.path, &request.params)?;
        tracing::debug!(method = %request.method, %url, "sending request");

        let method: http::Method = request.method.into();
        let mut req_builder = client.request(method, url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = request_body(&request) {
            req_builder = req_builder.body(body);
        }

        if let Some(timeout) = request.timeout.resolve(self.config.timeout) {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder.send().await?;

        let code = response.status().as_u16();
        let headers = HttpResponse::collect_headers(response.headers());
        let body = String::from_utf8_lossy(&response.bytes().await?).into_owned();
        tracing::debug!(code, "received response");

        check_timeout(HttpResponse {
            code,
            headers,
            body,
        })
    }
}
