use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP method for requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    PUT,
    POST,
    DELETE,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::PUT => http::Method::PUT,
            Method::POST => http::Method::POST,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// Ordered query parameters.
///
/// Consul reads several flags (`recurse`, `stale`, `keys`) by presence, so
/// pairs keep insertion order and may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Add `name` only when `value` is present.
    pub fn push_opt<V: ToString>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.0.push((name.into(), value.to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Per-request timeout override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestTimeout {
    /// Use the timeout the client was configured with.
    #[default]
    Default,
    /// No deadline for this request.
    Disabled,
    After(Duration),
}

impl RequestTimeout {
    /// A non-positive number of seconds disables the timeout.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs <= 0.0 || !secs.is_finite() {
            RequestTimeout::Disabled
        } else {
            RequestTimeout::After(Duration::from_secs_f64(secs))
        }
    }

    /// Resolve against the client-level default.
    pub fn resolve(self, default: Option<Duration>) -> Option<Duration> {
        match self {
            RequestTimeout::Default => default.filter(|timeout| !timeout.is_zero()),
            RequestTimeout::Disabled => None,
            RequestTimeout::After(timeout) => Some(timeout),
        }
    }
}

impl From<Duration> for RequestTimeout {
    fn from(timeout: Duration) -> Self {
        if timeout.is_zero() {
            RequestTimeout::Disabled
        } else {
            RequestTimeout::After(timeout)
        }
    }
}

/// A request against the agent, relative to its base URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,

    /// Absolute path on the agent, e.g. `/v1/kv/foo`
    pub path: String,

    pub params: Params,

    pub headers: HashMap<String, String>,

    pub body: Option<Vec<u8>>,

    pub timeout: RequestTimeout,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(name, value);
        self
    }

    /// Add a presence flag (`?recurse=`).
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.params.push(name, "");
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json_body(mut self, body: &impl Serialize) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: impl Into<RequestTimeout>) -> Self {
        self.timeout = timeout.into();
        self
    }
}

/// The normalized response every adapter produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub code: u16,

    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,

    /// Body decoded as UTF-8
    pub body: String,
}

impl HttpResponse {
    pub fn new(code: u16, body: impl Into<String>) -> Self {
        Self {
            code,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Deserialize the body
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Collect a reqwest header map into the normalized form.
    pub(crate) fn collect_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        let mut collected = HashMap::new();
        for (name, value) in headers {
            if let Ok(v) = value.to_str() {
                collected.insert(name.as_str().to_string(), v.to_string());
            }
        }
        collected
    }
}
