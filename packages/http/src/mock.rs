//! Mock HTTP executor for testing.
//!
//! Returns predefined responses keyed by request path and records every
//! request it sees. Implements both executor traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Error;
use crate::executor::{check_timeout, AsyncHttpExecutor, HttpExecutor};
use crate::types::{HttpRequest, HttpResponse};

/// A mock HTTP executor that returns predefined responses.
#[derive(Clone, Default)]
pub struct MockExecutor {
    /// Responses keyed by request path.
    responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
    /// Default response when no match found.
    default_response: Arc<Mutex<Option<HttpResponse>>>,
    /// Recorded requests for verification.
    recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
    /// Fail every request with this message.
    failure: Arc<Mutex<Option<String>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a specific path.
    pub fn with_response(self, path: impl Into<String>, response: HttpResponse) -> Self {
        self.responses.lock().insert(path.into(), response);
        self
    }

    /// Set a default response when no path matches.
    pub fn with_default_response(self, response: HttpResponse) -> Self {
        *self.default_response.lock() = Some(response);
        self
    }

    /// Fail all requests as if the connection was refused.
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        *self.failure.lock() = Some(message.into());
        self
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.recorded_requests.lock().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.recorded_requests.lock().last().cloned()
    }

    pub fn clear_recorded(&self) {
        self.recorded_requests.lock().clear();
    }

    /// Create a 200 response with a JSON body.
    pub fn json_response(body: serde_json::Value) -> HttpResponse {
        HttpResponse::new(200, body.to_string())
    }

    /// Create a 404 Not Found response.
    pub fn not_found() -> HttpResponse {
        HttpResponse::new(404, "")
    }

    fn respond(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.recorded_requests.lock().push(request.clone());

        if let Some(message) = self.failure.lock().clone() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                message,
            )));
        }

        if let Some(response) = self.responses.lock().get(&request.path) {
            return check_timeout(response.clone());
        }

        if let Some(response) = self.default_response.lock().clone() {
            return check_timeout(response);
        }

        Ok(Self::not_found())
    }
}

impl HttpExecutor for MockExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.respond(request)
    }
}

#[async_trait]
impl AsyncHttpExecutor for MockExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.respond(&request)
    }
}
