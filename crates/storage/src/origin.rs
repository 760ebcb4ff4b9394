use std::fmt;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::StoreError;
use crate::traits::Origin;

/// Characters left as-is in a path segment: the RFC 3986 unreserved set.
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Default timeout applied to origin requests.
pub const DEFAULT_ORIGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// `[origin]` settings for an [`HttpOrigin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Base URL; the key is appended as the request path.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Fetches entries over HTTP: `GET <base_url>/<key>`.
///
/// A 404 answer means the origin does not know the key. Headers from the
/// [`RequestContext`] are forwarded on every request.
pub struct HttpOrigin {
    base_url: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpOrigin {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_ORIGIN_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout,
            agent: build_agent(timeout),
        }
    }

    pub fn from_config(config: &OriginConfig) -> Self {
        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ORIGIN_TIMEOUT);
        Self::with_timeout(&config.base_url, timeout)
    }

    /// URL requested for `key`, with each path segment percent-encoded.
    ///
    /// Keys with no segments, or with a `.` or `..` segment, are rejected so
    /// a request never leaves `base_url`.
    pub fn url_for(&self, key: &str) -> Result<String, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(invalid("empty key"));
        }
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(invalid("contains a '.' or '..' segment"));
        }

        let path: Vec<String> = segments
            .iter()
            .map(|s| utf8_percent_encode(s, SEGMENT_SET).to_string())
            .collect();
        Ok(format!("{}/{}", self.base_url, path.join("/")))
    }
}

impl fmt::Debug for HttpOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOrigin")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

impl Origin for HttpOrigin {
    fn fetch(&self, key: &str, ctx: &RequestContext) -> Result<Option<Vec<u8>>, StoreError> {
        let url = self.url_for(key)?;

        // A context deadline different from ours needs its own agent.
        let custom;
        let agent = match ctx.timeout {
            Some(t) if t != self.timeout => {
                custom = build_agent(t);
                &custom
            }
            _ => &self.agent,
        };

        let mut request = agent.get(&url);
        for (name, value) in &ctx.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(key, url = %url, "fetching from origin");
        match request.call() {
            Ok(response) => {
                let bytes = response
                    .into_body()
                    .read_to_vec()
                    .map_err(|e| StoreError::Origin {
                        key: key.to_string(),
                        message: format!("error reading response: {}", e),
                    })?;
                Ok(Some(bytes))
            }
            Err(ureq::Error::StatusCode(404)) => Ok(None),
            Err(e) => Err(StoreError::Origin {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_key() {
        let origin = HttpOrigin::new("http://cache.internal/api/");
        assert_eq!(
            origin.url_for("product/v1/1").unwrap(),
            "http://cache.internal/api/product/v1/1"
        );
    }

    #[test]
    fn url_encodes_segments() {
        let origin = HttpOrigin::new("http://cache.internal");
        assert_eq!(
            origin.url_for("search/red shoes/ü").unwrap(),
            "http://cache.internal/search/red%20shoes/%C3%BC"
        );
        assert_eq!(
            origin.url_for("a/b?c=1#x").unwrap(),
            "http://cache.internal/a/b%3Fc%3D1%23x"
        );
    }

    #[test]
    fn url_rejects_dot_segments_and_empty_keys() {
        let origin = HttpOrigin::new("http://cache.internal/api");
        for key in ["a/../../admin", "./x", "..", "", "///"] {
            match origin.url_for(key) {
                Err(StoreError::InvalidKey { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected InvalidKey for {:?}, got {:?}", key, other),
            }
        }
        assert!(origin.url_for("v1.2/file.json").is_ok());
    }

    #[test]
    fn fetch_of_escaping_key_never_reaches_network() {
        let origin = HttpOrigin::with_timeout("http://127.0.0.1:9", Duration::from_millis(100));
        assert!(matches!(
            origin.fetch("../secret", &RequestContext::new()),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn config_timeout_defaults() {
        let origin = HttpOrigin::from_config(&OriginConfig {
            base_url: "http://x".to_string(),
            timeout_ms: None,
        });
        assert_eq!(origin.timeout, DEFAULT_ORIGIN_TIMEOUT);

        let origin = HttpOrigin::from_config(&OriginConfig {
            base_url: "http://x".to_string(),
            timeout_ms: Some(250),
        });
        assert_eq!(origin.timeout, Duration::from_millis(250));
    }

    #[test]
    fn unreachable_origin_is_an_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let origin = HttpOrigin::with_timeout("http://127.0.0.1:9", Duration::from_millis(500));
        match origin.fetch("product/1", &RequestContext::new()) {
            Err(StoreError::Origin { key, .. }) => assert_eq!(key, "product/1"),
            other => panic!("expected Origin error, got {:?}", other),
        }
    }
}
