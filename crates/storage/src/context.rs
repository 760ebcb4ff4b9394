use std::time::Duration;

/// Per-request data forwarded to the origin on a cache miss.
///
/// The expansion engine passes it through untouched; only
/// [`HttpOrigin`](crate::HttpOrigin) interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Headers copied onto every origin request (auth, tracing ids, ...).
    pub headers: Vec<(String, String)>,
    /// Overrides the origin's default timeout.
    pub timeout: Option<Duration>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
