//! Event transports.

use std::fmt;
use std::time::Duration;

use bon::Builder;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use super::{MonitorError, MonitorEvent};

/// Default request timeout for [`HttpSink`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Somewhere monitoring events can be delivered.
///
/// Implementations deliver a whole batch or fail; a failed batch may be
/// retried later by the caller.
pub trait EventSink: Send + Sync + fmt::Debug {
    fn send(&self, events: &[MonitorEvent]) -> Result<(), MonitorError>;
}

// =============================================================================
// HttpSink
// =============================================================================

/// Settings for [`HttpSink`].
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug))]
pub struct HttpSinkSettings {
    /// Service root; events are posted to `{base_url}/track`.
    pub base_url: Url,

    /// Per-request timeout. Default: 10 seconds.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

/// Posts events as a JSON array to `{base_url}/track`.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: Url,
}

impl HttpSink {
    /// Create a sink.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidUrl`] if the base URL cannot have a
    /// path, and [`MonitorError::Transport`] if the HTTP client cannot be
    /// created.
    pub fn new(settings: HttpSinkSettings) -> Result<Self, MonitorError> {
        let endpoint = track_endpoint(&settings.base_url)?;
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// The URL events are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl EventSink for HttpSink {
    fn send(&self, events: &[MonitorEvent]) -> Result<(), MonitorError> {
        debug!(endpoint = %self.endpoint, n_events = events.len(), "Posting monitoring events");

        let body = serde_json::to_vec(events)?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MonitorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

fn track_endpoint(base_url: &Url) -> Result<Url, MonitorError> {
    let mut endpoint = base_url.clone();
    endpoint
        .path_segments_mut()
        .map_err(|()| MonitorError::InvalidUrl {
            url: base_url.to_string(),
            reason: "URL cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .push("track");
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://app.tangram.xyz", "https://app.tangram.xyz/track")]
    #[case("http://localhost:8080/", "http://localhost:8080/track")]
    #[case("http://localhost:8080/api", "http://localhost:8080/api/track")]
    #[case("http://localhost:8080/api/", "http://localhost:8080/api/track")]
    fn endpoint_appends_track(#[case] base: &str, #[case] expected: &str) {
        let base = Url::parse(base).unwrap();
        assert_eq!(track_endpoint(&base).unwrap().as_str(), expected);
    }

    #[test]
    fn rejects_non_base_urls() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(matches!(
            track_endpoint(&base),
            Err(MonitorError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn settings_default_timeout() {
        let settings = HttpSinkSettings::builder()
            .base_url(Url::parse("http://localhost:1").unwrap())
            .build();
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        let sink = HttpSink::new(settings).unwrap();
        assert_eq!(sink.endpoint().as_str(), "http://localhost:1/track");
    }
}
