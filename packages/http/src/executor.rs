//! The adapter seam.
//!
//! Every adapter speaks the same four verbs. The synchronous and asynchronous
//! flavours are separate traits so that one type can implement both (the
//! test mock does).

use async_trait::async_trait;

use crate::error::Error;
use crate::types::{HttpRequest, HttpResponse, Method, Params};

/// Status some HTTP stacks synthesize for a request that hit its deadline.
pub const TIMEOUT_STATUS: u16 = 599;

/// Map a synthesized timeout status to [`Error::Timeout`].
pub(crate) fn check_timeout(response: HttpResponse) -> Result<HttpResponse, Error> {
    if response.code == TIMEOUT_STATUS {
        Err(Error::Timeout)
    } else {
        Ok(response)
    }
}

/// Trait for executing HTTP requests synchronously.
pub trait HttpExecutor: Send + Sync {
    /// Execute a request and return the normalized response.
    ///
    /// Non-2xx statuses are responses, not errors.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;

    fn get(&self, path: &str, params: Params) -> Result<HttpResponse, Error> {
        self.execute(&HttpRequest::get(path).with_params(params))
    }

    fn put(&self, path: &str, params: Params, body: Vec<u8>) -> Result<HttpResponse, Error> {
        self.execute(&HttpRequest::put(path).with_params(params).with_body(body))
    }

    fn post(&self, path: &str, params: Params, body: Vec<u8>) -> Result<HttpResponse, Error> {
        self.execute(&HttpRequest::post(path).with_params(params).with_body(body))
    }

    fn delete(&self, path: &str, params: Params) -> Result<HttpResponse, Error> {
        self.execute(&HttpRequest::delete(path).with_params(params))
    }
}

/// Trait for executing HTTP requests on an async runtime.
#[async_trait]
pub trait AsyncHttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error>;

    async fn get(&self, path: &str, params: Params) -> Result<HttpResponse, Error> {
        self.execute(HttpRequest::get(path).with_params(params))
            .await
    }

    async fn put(&self, path: &str, params: Params, body: Vec<u8>) -> Result<HttpResponse, Error> {
        self.execute(HttpRequest::put(path).with_params(params).with_body(body))
            .await
    }

    async fn post(
        &self,
        path: &str,
        params: Params,
        body: Vec<u8>,
    ) -> Result<HttpResponse, Error> {
        self.execute(HttpRequest::post(path).with_params(params).with_body(body))
            .await
    }

    async fn delete(&self, path: &str, params: Params) -> Result<HttpResponse, Error> {
        self.execute(HttpRequest::delete(path).with_params(params))
            .await
    }
}

/// Body to send for a request.
///
/// PUT and POST always carry a body, empty when none was given.
pub(crate) fn request_body(request: &HttpRequest) -> Option<Vec<u8>> {
    match (request.method, &request.body) {
        (_, Some(body)) => Some(body.clone()),
        (Method::PUT | Method::POST, None) => Some(Vec::new()),
        _ => None,
    }
}
