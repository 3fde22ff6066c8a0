//! Crate-level error type.
//!
//! Each subsystem has its own error enum; [`Error`] unifies them so that
//! application code can use `?` across loading, prediction options, and
//! monitoring calls.

use thiserror::Error;

use crate::io::{DeserializeError, SerializeError};
use crate::model::LoadError;
use crate::monitor::MonitorError;
use crate::predict::OptionsError;

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The model could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A model could not be written.
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// Prediction options failed validation.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// An event could not be delivered to the monitoring service.
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

impl From<DeserializeError> for Error {
    fn from(err: DeserializeError) -> Self {
        Self::Load(LoadError::from(err))
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
