//! Testing utilities for modelkit.
//!
//! Assertion helpers, hand-built model fixtures, and an in-memory
//! [`EventSink`](crate::monitor::EventSink), shared by unit tests,
//! integration tests, and the demos.
//!
//! ```
//! use modelkit::testing::{fixtures, RecordingSink};
//! use modelkit::io::ModelFile;
//! use modelkit::Model;
//!
//! let parts = ModelFile::new(fixtures::iris_linear()).into_parts().unwrap();
//! let sink = RecordingSink::new();
//! let model = Model::from_parts(parts, Box::new(sink.clone()), 1);
//! let output = model.predict_one(&fixtures::iris_input([5.1, 3.5, 1.4, 0.2]), None);
//! assert!(output.feature_contributions().is_none());
//! ```

pub mod fixtures;
mod sink;

pub use sink::RecordingSink;

use crate::inference::transform::sigmoid;
use crate::inference::OutputTransform;
use crate::model::TaskKind;
use crate::predict::{FeatureContributions, PredictOutput};

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for floating point comparisons of O(1) values.
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

// =============================================================================
// Floating Point Assertions
// =============================================================================

/// Assert that two f32 values are approximately equal.
///
/// # Examples
///
/// ```
/// # use modelkit::assert_approx_eq;
/// assert_approx_eq!(1.0f32, 1.0001f32, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)` - {}\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                format_args!($($arg)+), left_val, right_val, diff, tol
            );
        }
    }};
}

// =============================================================================
// Prediction Assertions
// =============================================================================

/// Assert that every output's feature contributions explain its prediction.
///
/// For each output group `baseline + Σ contributions` must equal the reported
/// margin, and the margins must reproduce the prediction: the value for
/// regression, the positive class probability through a sigmoid for binary
/// classification, every class probability through a softmax for multiclass.
///
/// # Panics
///
/// Panics if an output carries no contributions, does not match `task`, or
/// any comparison is off by more than `tolerance`.
pub fn assert_contributions_explain(
    task: &TaskKind,
    outputs: &[PredictOutput],
    tolerance: f32,
    context: &str,
) {
    for (row, output) in outputs.iter().enumerate() {
        let context = format!("{context}[{row}]");
        match (task, output) {
            (TaskKind::Regression, PredictOutput::Regression(output)) => {
                let contributions = present(output.feature_contributions.as_ref(), &context);
                assert_sums_to_margin(contributions, tolerance, &context);
                assert_approx_eq!(
                    contributions.output_value,
                    output.value,
                    tolerance,
                    "{context}: margin vs value"
                );
            }
            (
                TaskKind::BinaryClassification { positive_class, .. },
                PredictOutput::BinaryClassification(output),
            ) => {
                let contributions = present(output.feature_contributions.as_ref(), &context);
                assert_sums_to_margin(contributions, tolerance, &context);
                let positive = if output.class_name == *positive_class {
                    output.probability
                } else {
                    1.0 - output.probability
                };
                assert_approx_eq!(
                    sigmoid(contributions.output_value),
                    positive,
                    tolerance,
                    "{context}: sigmoid(margin) vs P({positive_class})"
                );
            }
            (
                TaskKind::MulticlassClassification { classes },
                PredictOutput::MulticlassClassification(output),
            ) => {
                let by_class = present(output.feature_contributions.as_ref(), &context);
                let mut probabilities: Vec<f32> = classes
                    .iter()
                    .map(|class| {
                        let context = format!("{context} class {class}");
                        let contributions = present(by_class.get(class), &context);
                        assert_sums_to_margin(contributions, tolerance, &context);
                        contributions.output_value
                    })
                    .collect();
                OutputTransform::Softmax.transform_row(&mut probabilities);
                for (class, probability) in classes.iter().zip(probabilities) {
                    assert_approx_eq!(
                        probability,
                        output.probabilities[class],
                        tolerance,
                        "{context}: softmax(margins) vs P({class})"
                    );
                }
            }
            (task, output) => panic!("{context}: {output:?} is not a {task:?} output"),
        }
    }
}

fn present<'a, T>(value: Option<&'a T>, context: &str) -> &'a T {
    value.unwrap_or_else(|| panic!("{context}: no feature contributions"))
}

fn assert_sums_to_margin(contributions: &FeatureContributions, tolerance: f32, context: &str) {
    let total: f32 = contributions
        .entries
        .iter()
        .map(|entry| entry.feature_contribution_value())
        .sum();
    assert_approx_eq!(
        contributions.baseline_value + total,
        contributions.output_value,
        tolerance,
        "{context}: baseline + contributions vs margin"
    );
}
