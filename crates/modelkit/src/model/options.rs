//! Load-time configuration and errors.

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;
use thiserror::Error;

use crate::io::{DeserializeError, ValidationError};
use crate::monitor::{MonitorError, DEFAULT_TIMEOUT};

/// Monitoring service used when [`LoadModelOptions::base_url`] is unset.
pub const DEFAULT_BASE_URL: &str = "https://app.tangram.xyz";

// =============================================================================
// LoadError
// =============================================================================

/// Errors loading a model.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The model file could not be read.
    #[error("failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a readable model file.
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),

    /// The file decodes but does not describe a usable model.
    #[error("invalid model: {0}")]
    Validation(#[from] ValidationError),

    /// The monitoring base URL does not parse.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The monitoring client could not be set up.
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

// =============================================================================
// LoadModelOptions
// =============================================================================

/// Options for loading a model.
///
/// # Example
///
/// ```
/// use modelkit::LoadModelOptions;
///
/// let base_url = std::env::var("MODELKIT_URL").ok();
/// let options = LoadModelOptions::builder().maybe_base_url(base_url).build();
/// assert_eq!(options.n_threads, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(derive(Clone, Debug))]
pub struct LoadModelOptions {
    /// Monitoring service root. `None` uses [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,

    /// Timeout for monitoring requests. Default: 10 seconds.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// Threads for batch prediction: 0 = rayon global pool, 1 = sequential.
    #[builder(default)]
    pub n_threads: usize,
}

impl LoadModelOptions {
    /// The base URL to report to.
    pub fn base_url_or_default(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

impl Default for LoadModelOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}
