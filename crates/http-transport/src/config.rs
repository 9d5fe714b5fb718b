use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use parley_transport::Mode;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Returns the path a mode is posted to unless overridden.
#[inline]
pub fn default_endpoint(mode: Mode) -> &'static str {
    match mode {
        Mode::Chat => "/api/chat",
        Mode::Advanced => "/api/chat/advanced",
        Mode::Hybrid => "/api/chat/hybrid",
        Mode::Vision => "/api/vision/query",
    }
}

/// Builder for [`HttpTransportConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpTransportConfigBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
    endpoints: HashMap<Mode, String>,
}

impl HttpTransportConfigBuilder {
    /// Creates a builder for the backend at `base_url`.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: None,
            endpoints: HashMap::new(),
        }
    }

    /// Sets a bearer token sent with every request.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets how long a request may take before it fails.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the path a mode is posted to.
    #[inline]
    pub fn with_endpoint<S: Into<String>>(mut self, mode: Mode, path: S) -> Self {
        self.endpoints.insert(mode, path.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpTransportConfig {
        let mut endpoints = self.endpoints;
        for mode in Mode::ALL {
            endpoints
                .entry(mode)
                .or_insert_with(|| default_endpoint(mode).to_owned());
        }
        HttpTransportConfig {
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            api_key: self.api_key,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            endpoints,
        }
    }
}

impl Debug for HttpTransportConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfigBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// Configuration for [`crate::HttpTransport`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout: Duration,
    endpoints: HashMap<Mode, String>,
}

impl HttpTransportConfig {
    /// Returns the full URL a mode is posted to.
    pub fn url(&self, mode: Mode) -> String {
        let path = self
            .endpoints
            .get(&mode)
            .map(String::as_str)
            .unwrap_or_else(|| default_endpoint(mode));
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = HttpTransportConfigBuilder::with_base_url(
            "http://localhost:8000/",
        )
        .with_endpoint(Mode::Hybrid, "v2/hybrid")
        .build();
        assert_eq!(config.url(Mode::Chat), "http://localhost:8000/api/chat");
        assert_eq!(
            config.url(Mode::Vision),
            "http://localhost:8000/api/vision/query"
        );
        assert_eq!(config.url(Mode::Hybrid), "http://localhost:8000/v2/hybrid");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = HttpTransportConfigBuilder::with_base_url("http://x")
            .with_api_key("secret-token")
            .build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
