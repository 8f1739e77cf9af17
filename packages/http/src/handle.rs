use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

/// The state of a request started on the callback event loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Request is in progress
    Pending,
    /// A response arrived (of any status code)
    Complete,
    /// The request failed before a response arrived
    Failed,
}

/// Status of a callback request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestStatus {
    pub id: String,

    pub state: RequestState,

    /// Error message if state is Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestStatus {
    pub fn pending(id: String) -> Self {
        Self {
            id,
            state: RequestState::Pending,
            error: None,
        }
    }

    pub fn complete(id: String) -> Self {
        Self {
            id,
            state: RequestState::Complete,
            error: None,
        }
    }

    pub fn failed(id: String, error: String) -> Self {
        Self {
            id,
            state: RequestState::Failed,
            error: Some(error),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    pub fn is_complete(&self) -> bool {
        self.state == RequestState::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.state == RequestState::Failed
    }
}

struct SharedHandle {
    status: Mutex<RequestStatus>,
    completed: Condvar,
}

/// Handle to a request running on the callback event loop.
///
/// Cloning is cheap; all clones observe the same request.
#[derive(Clone)]
pub struct RequestHandle {
    shared: Arc<SharedHandle>,
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("status", &*self.shared.status.lock())
            .finish()
    }
}

impl RequestHandle {
    pub(crate) fn new(id: String) -> Self {
        Self {
            shared: Arc::new(SharedHandle {
                status: Mutex::new(RequestStatus::pending(id)),
                completed: Condvar::new(),
            }),
        }
    }

    pub fn id(&self) -> String {
        self.shared.status.lock().id.clone()
    }

    pub fn status(&self) -> RequestStatus {
        self.shared.status.lock().clone()
    }

    pub(crate) fn complete(&self) {
        let mut status = self.shared.status.lock();
        *status = RequestStatus::complete(status.id.clone());
        self.shared.completed.notify_all();
    }

    pub(crate) fn fail(&self, error: String) {
        let mut status = self.shared.status.lock();
        *status = RequestStatus::failed(status.id.clone(), error);
        self.shared.completed.notify_all();
    }

    /// Block the calling thread until the request finishes.
    ///
    /// Must not be called from a task running on the event loop itself.
    pub fn wait(&self) -> RequestStatus {
        let mut status = self.shared.status.lock();
        while status.is_pending() {
            self.shared.completed.wait(&mut status);
        }
        status.clone()
    }

    /// Like [`RequestHandle::wait`], giving up after `timeout`.
    ///
    /// Returns `None` if the request is still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RequestStatus> {
        let deadline = Instant::now() + timeout;
        let mut status = self.shared.status.lock();
        while status.is_pending() {
            if self
                .shared
                .completed
                .wait_until(&mut status, deadline)
                .timed_out()
            {
                return if status.is_pending() {
                    None
                } else {
                    Some(status.clone())
                };
            }
        }
        Some(status.clone())
    }
}
