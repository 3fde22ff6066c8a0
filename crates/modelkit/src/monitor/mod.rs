//! Reporting predictions and true values to a monitoring service.
//!
//! - [`MonitorEvent`]: the JSON records the service receives
//! - [`EventSink`]: transport abstraction; [`HttpSink`] posts to
//!   `{base_url}/track`
//! - [`Monitor`]: per-model reporter with an optional event queue

mod client;
mod event;
mod sink;

pub use client::Monitor;
pub use event::{LogPredictionArgs, LogTrueValueArgs, MonitorEvent, NumberOrString};
pub use sink::{EventSink, HttpSink, HttpSinkSettings, DEFAULT_TIMEOUT};

use thiserror::Error;

/// Errors delivering events.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The service could not be reached (connection, DNS, timeout).
    #[error("failed to reach the monitoring service: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("monitoring service rejected events with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Events could not be encoded as JSON.
    #[error("failed to encode events: {0}")]
    Encode(#[from] serde_json::Error),

    /// The service URL cannot be used as a base for `/track`.
    #[error("invalid monitoring URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
