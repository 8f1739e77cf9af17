use std::time::Duration;

use crate::config::Consistency;

/// Per-call settings for read endpoints.
///
/// Unset fields fall back to the client's [`ConsulConfig`](crate::ConsulConfig).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Block until the state index exceeds this value
    pub index: Option<u64>,
    /// Longest time a blocking query may wait
    pub wait: Option<Duration>,
    pub consistency: Option<Consistency>,
    pub dc: Option<String>,
    pub token: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the index moves past `index`, for at most `wait`.
    pub fn blocking(index: u64, wait: Duration) -> Self {
        Self {
            index: Some(index),
            wait: Some(wait),
            ..Default::default()
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    pub fn with_dc(mut self, dc: impl Into<String>) -> Self {
        self.dc = Some(dc.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Per-call settings for write endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub dc: Option<String>,
    pub token: Option<String>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dc(mut self, dc: impl Into<String>) -> Self {
        self.dc = Some(dc.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Format a duration the way Consul parses them (`10s`, `1500ms`).
pub fn duration_string(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}
