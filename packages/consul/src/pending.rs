use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use consul_http::{RequestHandle, RequestStatus};

use crate::error::Error;

type Listener<T> = Box<dyn FnOnce(Result<T, Error>) + Send>;

enum State<T> {
    /// No result yet; maybe a listener to hand it to
    Waiting(Option<Listener<T>>),
    Ready(Result<T, Error>),
    /// Delivered to a listener or a waiter
    Taken,
}

pub(crate) struct Slot<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Waiting(None)),
            ready: Condvar::new(),
        })
    }

    /// Store the result, or hand it straight to a registered listener.
    pub(crate) fn fill(&self, result: Result<T, Error>) {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Taken) {
            State::Waiting(Some(listener)) => {
                drop(state);
                listener(result);
            }
            State::Waiting(None) => {
                *state = State::Ready(result);
                self.ready.notify_all();
            }
            // filled twice; keep the first result
            other => *state = other,
        }
    }
}

/// The result of a call started on the callback adapter.
///
/// Either block for the decoded value with [`Pending::wait`] or have it
/// delivered with [`Pending::on_complete`].
pub struct Pending<T> {
    slot: Arc<Slot<T>>,
    handle: RequestHandle,
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending")
            .field("handle", &self.handle)
            .field("ready", &matches!(*self.slot.state.lock(), State::Ready(_)))
            .finish()
    }
}

impl<T: Send + 'static> Pending<T> {
    pub(crate) fn new(slot: Arc<Slot<T>>, handle: RequestHandle) -> Self {
        Self { slot, handle }
    }

    pub fn id(&self) -> String {
        self.handle.id()
    }

    /// Transport-level status of the underlying request
    pub fn status(&self) -> RequestStatus {
        self.handle.status()
    }

    /// Whether the decoded result is available
    pub fn is_ready(&self) -> bool {
        matches!(*self.slot.state.lock(), State::Ready(_))
    }

    /// Block the calling thread until the result is available.
    ///
    /// Must not be called from the adapter's own event loop.
    pub fn wait(self) -> Result<T, Error> {
        let mut state = self.slot.state.lock();
        loop {
            match std::mem::replace(&mut *state, State::Taken) {
                State::Ready(result) => return result,
                other => {
                    *state = other;
                    self.slot.ready.wait(&mut state);
                }
            }
        }
    }

    /// Like [`Pending::wait`], giving the call back if it is still running
    /// after `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Result<T, Error>, Self> {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.slot.state.lock();
            loop {
                match std::mem::replace(&mut *state, State::Taken) {
                    State::Ready(result) => return Ok(result),
                    other => *state = other,
                }
                if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                    if let State::Ready(_) = &*state {
                        continue;
                    }
                    break;
                }
            }
        }
        Err(self)
    }

    /// Deliver the result to `listener`.
    ///
    /// Runs on the event loop when the call finishes, or immediately on the
    /// calling thread if it already has.
    pub fn on_complete<F>(self, listener: F)
    where
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let mut state = self.slot.state.lock();
        match std::mem::replace(&mut *state, State::Taken) {
            State::Ready(result) => {
                drop(state);
                listener(result);
            }
            _ => *state = State::Waiting(Some(Box::new(listener))),
        }
    }
}
