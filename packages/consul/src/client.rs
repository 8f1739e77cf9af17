use std::sync::Arc;

use consul_http::{asynchronous, blocking, callback, HttpRequest, Method};

use crate::api::{Agent, Catalog, Health, Kv, Session, Status};
use crate::call::ApiCall;
use crate::config::ConsulConfig;
use crate::dispatch::{Async, Blocking, Callback, Dispatch};
use crate::error::Error;
use crate::options::{duration_string, QueryOptions, WriteOptions};

pub const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul API client.
///
/// `D` picks the adapter: [`Consul::blocking`], [`Consul::asynchronous`] or
/// [`Consul::callback`]. Endpoint groups are reached through [`Consul::kv`],
/// [`Consul::agent`] and friends.
///
/// # Example
///
/// ```ignore
/// use consul::{Consul, ConsulConfig, QueryOptions};
///
/// let consul = Consul::blocking(ConsulConfig::from_env()?)?;
/// consul.kv().put("app/mode", "green", &Default::default())?;
/// let entry = consul.kv().get("app/mode", &QueryOptions::new())?;
/// ```
pub struct Consul<D> {
    dispatcher: D,
    config: Arc<ConsulConfig>,
}

impl Consul<Blocking> {
    pub fn blocking(config: ConsulConfig) -> Result<Self, Error> {
        let client = blocking::HttpClient::new(config.http.clone())?;
        Ok(Self::with_dispatcher(Blocking::new(client), config))
    }
}

impl Consul<Async> {
    pub fn asynchronous(config: ConsulConfig) -> Result<Self, Error> {
        let client = asynchronous::HttpClient::new(config.http.clone())?;
        Ok(Self::with_dispatcher(Async::new(client), config))
    }

    /// Close all opened HTTP connections
    pub fn close(&self) {
        self.dispatcher.executor().close();
    }
}

impl Consul<Callback> {
    pub fn callback(config: ConsulConfig) -> Result<Self, Error> {
        let client = callback::HttpClient::new(config.http.clone())?;
        Ok(Self::with_dispatcher(Callback::new(client), config))
    }
}

impl<D: Dispatch> Consul<D> {
    pub fn with_dispatcher(dispatcher: D, config: ConsulConfig) -> Self {
        Self {
            dispatcher,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ConsulConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn kv(&self) -> Kv<'_, D> {
        Kv::new(self)
    }

    pub fn agent(&self) -> Agent<'_, D> {
        Agent::new(self)
    }

    pub fn health(&self) -> Health<'_, D> {
        Health::new(self)
    }

    pub fn catalog(&self) -> Catalog<'_, D> {
        Catalog::new(self)
    }

    pub fn status(&self) -> Status<'_, D> {
        Status::new(self)
    }

    pub fn session(&self) -> Session<'_, D> {
        Session::new(self)
    }

    /// Run a prepared call on this client's adapter.
    pub fn dispatch<T: Send + 'static>(&self, call: ApiCall<T>) -> D::Output<T> {
        match call.request() {
            Ok(request) => tracing::trace!(method = %request.method, path = %request.path, "dispatching call"),
            Err(error) => tracing::debug!(%error, "call failed before sending"),
        }
        self.dispatcher.dispatch(call)
    }

    /// A request carrying only the ACL token.
    pub(crate) fn request(&self, method: Method, path: &str, token: Option<&str>) -> HttpRequest {
        let request = HttpRequest::new(method, path);
        match token.or(self.config.token.as_deref()) {
            Some(token) => request.with_header(TOKEN_HEADER, token),
            None => request,
        }
    }

    /// A read request: token, datacenter, consistency and blocking-query
    /// parameters.
    pub(crate) fn read_request(
        &self,
        method: Method,
        path: &str,
        options: &QueryOptions,
    ) -> HttpRequest {
        let mut request = self.request(method, path, options.token.as_deref());

        request
            .params
            .push_opt("dc", options.dc.as_ref().or(self.config.dc.as_ref()));
        if let Some(flag) = options
            .consistency
            .unwrap_or(self.config.consistency)
            .flag()
        {
            request.params.push(flag, "");
        }
        request.params.push_opt("index", options.index);
        request
            .params
            .push_opt("wait", options.wait.map(duration_string));

        request
    }

    /// A write request: token and datacenter.
    pub(crate) fn write_request(
        &self,
        method: Method,
        path: &str,
        options: &WriteOptions,
    ) -> HttpRequest {
        let mut request = self.request(method, path, options.token.as_deref());
        request
            .params
            .push_opt("dc", options.dc.as_ref().or(self.config.dc.as_ref()));
        request
    }

    /// Datacenter a write goes to, if any was chosen.
    pub(crate) fn write_dc(&self, options: &WriteOptions) -> Option<String> {
        options.dc.clone().or_else(|| self.config.dc.clone())
    }
}
