use consul_http::{HttpRequest, HttpResponse};

use crate::error::Error;

/// Decoder applied to the response of an [`ApiCall`].
pub type Decoder<T> = Box<dyn FnOnce(HttpResponse) -> Result<T, Error> + Send>;

/// A request plus the callback that decodes its response.
///
/// Endpoints only build calls; a [`Dispatch`](crate::Dispatch) implementation
/// runs them on one of the adapters. A call whose request could not be built
/// carries the error and fails when dispatched, without any I/O.
pub struct ApiCall<T> {
    request: Result<HttpRequest, Error>,
    decoder: Decoder<T>,
}

impl<T> std::fmt::Debug for ApiCall<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCall")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<T> ApiCall<T> {
    pub fn new<F>(request: HttpRequest, decoder: F) -> Self
    where
        F: FnOnce(HttpResponse) -> Result<T, Error> + Send + 'static,
    {
        Self::from_result(Ok(request), decoder)
    }

    pub fn from_result<F>(request: Result<HttpRequest, Error>, decoder: F) -> Self
    where
        F: FnOnce(HttpResponse) -> Result<T, Error> + Send + 'static,
    {
        Self {
            request,
            decoder: Box::new(decoder),
        }
    }

    pub fn request(&self) -> Result<&HttpRequest, &Error> {
        self.request.as_ref()
    }

    /// Apply the decoder to a response obtained elsewhere.
    pub fn decode(self, response: HttpResponse) -> Result<T, Error> {
        (self.decoder)(response)
    }

    pub fn into_parts(self) -> (Result<HttpRequest, Error>, Decoder<T>) {
        (self.request, self.decoder)
    }

    /// Post-process the decoded value.
    pub fn map<U, F>(self, f: F) -> ApiCall<U>
    where
        T: 'static,
        U: 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let decoder = self.decoder;
        ApiCall {
            request: self.request,
            decoder: Box::new(move |response| decoder(response).map(f)),
        }
    }
}
