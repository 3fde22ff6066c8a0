//! Per-call prediction options.

use bon::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// OptionsError
// =============================================================================

/// Invalid prediction options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    /// The binary classification threshold must lie in `[0, 1]`.
    #[error("threshold must be in [0, 1], got {0}")]
    InvalidThreshold(f32),
}

// =============================================================================
// PredictOptions
// =============================================================================

/// Options for a prediction call.
///
/// Serialized with camelCase keys when attached to a logged prediction.
///
/// # Example
///
/// ```
/// use modelkit::PredictOptions;
///
/// let options = PredictOptions::builder()
///     .threshold(0.3)
///     .compute_feature_contributions(true)
///     .build()
///     .unwrap();
/// assert_eq!(options.threshold, 0.3);
///
/// assert!(PredictOptions::builder().threshold(1.5).build().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(rename_all = "camelCase")]
pub struct PredictOptions {
    /// Probability at or above which a binary classifier predicts the
    /// positive class. Default: 0.5.
    #[builder(default = 0.5)]
    pub threshold: f32,

    /// Attach per-feature contributions to the output. Default: false.
    #[builder(default)]
    pub compute_feature_contributions: bool,
}

impl<S: predict_options_builder::IsComplete> PredictOptionsBuilder<S> {
    /// Build and validate the options.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::InvalidThreshold`] if the threshold is NaN or
    /// outside `[0, 1]`.
    pub fn build(self) -> Result<PredictOptions, OptionsError> {
        let options = self.__build_internal();
        options.validate()?;
        Ok(options)
    }
}

impl PredictOptions {
    /// Check option ranges.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(OptionsError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            compute_feature_contributions: false,
        }
    }
}
