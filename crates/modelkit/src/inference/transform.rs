//! Output transformation for inference.
//!
//! The [`OutputTransform`] enum defines how raw model outputs (margins)
//! are converted to final predictions. It follows from the model's task, so
//! it is derived on load rather than stored.
//!
//! # Variants
//!
//! - [`Identity`](OutputTransform::Identity): No transformation (regression)
//! - [`Sigmoid`](OutputTransform::Sigmoid): Logistic sigmoid for binary classification
//! - [`Softmax`](OutputTransform::Softmax): Softmax for multiclass classification

use crate::model::TaskKind;

/// Inference-time output transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTransform {
    /// No transformation; output = margin.
    #[default]
    Identity,

    /// Logistic sigmoid: output = 1 / (1 + exp(-margin)).
    Sigmoid,

    /// Softmax: output_i = exp(margin_i) / sum(exp(margin_j)).
    Softmax,
}

impl OutputTransform {
    /// The transform a model of this task applies to its margins.
    pub fn for_task(task: &TaskKind) -> Self {
        match task {
            TaskKind::Regression => OutputTransform::Identity,
            TaskKind::BinaryClassification { .. } => OutputTransform::Sigmoid,
            TaskKind::MulticlassClassification { .. } => OutputTransform::Softmax,
        }
    }

    /// Apply the transformation in-place to the margins of one row.
    ///
    /// # Numerical Stability
    ///
    /// - Sigmoid clamps input to [-500, 500] to avoid overflow.
    /// - Softmax subtracts the row max before exponentiating.
    ///
    /// NaN inputs propagate through without panics.
    #[inline]
    pub fn transform_row(&self, row: &mut [f32]) {
        match self {
            OutputTransform::Identity => {}
            OutputTransform::Sigmoid => {
                for x in row.iter_mut() {
                    *x = sigmoid(*x);
                }
            }
            OutputTransform::Softmax => softmax_inplace(row),
        }
    }
}

/// Numerically stable sigmoid.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    let clamped = x.clamp(-500.0, 500.0);
    if clamped >= 0.0 {
        1.0 / (1.0 + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax in-place.
#[inline]
fn softmax_inplace(row: &mut [f32]) {
    if row.is_empty() {
        return;
    }

    let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.0f32;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }

    if sum > 0.0 {
        for x in row.iter_mut() {
            *x /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_is_noop() {
        let mut preds = vec![1.0, -2.0, 3.5];
        OutputTransform::Identity.transform_row(&mut preds);
        assert_eq!(preds, vec![1.0, -2.0, 3.5]);
    }

    #[test]
    fn sigmoid_zero_is_half() {
        let mut preds = vec![0.0];
        OutputTransform::Sigmoid.transform_row(&mut preds);
        assert_abs_diff_eq!(preds[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn sigmoid_extremes_stable() {
        let mut preds = vec![-100.0, 100.0, f32::NEG_INFINITY, f32::INFINITY];
        OutputTransform::Sigmoid.transform_row(&mut preds);
        assert!(preds[0] < 0.001);
        assert!(preds[1] > 0.999);
        assert!(preds[2] < 0.001);
        assert!(preds[3] > 0.999);
    }

    #[test]
    fn sigmoid_nan_propagates() {
        let mut preds = vec![f32::NAN];
        OutputTransform::Sigmoid.transform_row(&mut preds);
        assert!(preds[0].is_nan());
    }

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let mut preds = vec![1.0, 2.0, 3.0];
        OutputTransform::Softmax.transform_row(&mut preds);
        let sum: f32 = preds.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(preds[0] < preds[1] && preds[1] < preds[2]);
    }

    #[test]
    fn softmax_large_values_stable() {
        let mut preds = vec![100.0, 200.0, 300.0];
        OutputTransform::Softmax.transform_row(&mut preds);
        let sum: f32 = preds.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(preds[2] > 0.99);
    }

    #[test]
    fn task_mapping() {
        assert_eq!(OutputTransform::for_task(&TaskKind::Regression), OutputTransform::Identity);
        let binary = TaskKind::BinaryClassification {
            negative_class: "no".into(),
            positive_class: "yes".into(),
        };
        assert_eq!(OutputTransform::for_task(&binary), OutputTransform::Sigmoid);
        let multi = TaskKind::MulticlassClassification {
            classes: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(OutputTransform::for_task(&multi), OutputTransform::Softmax);
    }
}
