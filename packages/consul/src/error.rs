/// Errors returned by Consul API calls.
///
/// Transport failures come from the adapter; the remaining variants classify
/// the agent's answer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] consul_http::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("ACL support disabled: {0}")]
    AclDisabled(String),

    #[error("ACL permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{code} {body}")]
    Server { code: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_timeout())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }
}
