//! Linear model data structure.

use ndarray::{s, Array2, ArrayView1, ArrayView2};

/// Linear model (weights + bias + training feature means).
///
/// The weights are stored as an `Array2<f32>` with shape `[n_features + 1, n_groups]`:
///
/// ```text
/// weights[[feature, group]] → coefficient
/// weights[[n_features, group]] → bias (last row)
/// ```
///
/// `means` holds the training mean of every feature; predictions do not use
/// it, feature contributions do.
///
/// # Example
///
/// ```
/// use modelkit::repr::LinearModel;
/// use ndarray::array;
///
/// let weights = array![
///     [0.5],  // feature 0
///     [-1.0], // feature 1
///     [0.25], // bias
/// ];
/// let model = LinearModel::from_array(weights, vec![0.0, 0.0]);
///
/// assert_eq!(model.predict_row(&[2.0, 1.0]), vec![0.25]);
/// ```
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array2<f32>,
    means: Vec<f32>,
}

impl LinearModel {
    /// Create a linear model from a weight matrix and feature means.
    ///
    /// # Panics
    ///
    /// Panics if the array has no bias row or `means` does not have one entry
    /// per feature.
    pub fn from_array(weights: Array2<f32>, means: Vec<f32>) -> Self {
        assert!(weights.nrows() >= 1, "weights must have at least 1 row (bias)");
        assert_eq!(means.len(), weights.nrows() - 1, "one mean per feature");
        Self { weights, means }
    }

    /// Build from a flat feature-major weight slice, returning `None` when
    /// the lengths do not describe a `[n_features + 1, n_groups]` matrix
    /// with one mean per feature.
    pub fn from_flat(
        weights: Vec<f32>,
        means: Vec<f32>,
        n_features: usize,
        n_groups: usize,
    ) -> Option<Self> {
        if means.len() != n_features || n_groups == 0 {
            return None;
        }
        let weights = Array2::from_shape_vec((n_features + 1, n_groups), weights).ok()?;
        Some(Self { weights, means })
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.weights.nrows() - 1
    }

    /// Number of output groups.
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn weight(&self, feature: usize, group: usize) -> f32 {
        self.weights[[feature, group]]
    }

    #[inline]
    pub fn bias(&self, group: usize) -> f32 {
        self.weights[[self.n_features(), group]]
    }

    /// Get all biases as a view of length `n_groups`.
    #[inline]
    pub fn biases(&self) -> ArrayView1<'_, f32> {
        self.weights.row(self.n_features())
    }

    /// Coefficient rows without the bias, shape `[n_features, n_groups]`.
    #[inline]
    pub fn coefficients(&self) -> ArrayView2<'_, f32> {
        self.weights.slice(s![..-1, ..])
    }

    /// Training mean of each feature.
    #[inline]
    pub fn means(&self) -> &[f32] {
        &self.means
    }

    /// Flat weights in storage order (feature-major, bias last).
    pub fn to_flat(&self) -> Vec<f32> {
        self.weights.iter().copied().collect()
    }

    /// Predict margins for a single row, writing one value per group.
    ///
    /// # Panics
    ///
    /// Panics if `output.len() != n_groups`.
    pub fn predict_row_into(&self, features: &[f32], output: &mut [f32]) {
        assert_eq!(output.len(), self.n_groups());
        for (group, out) in output.iter_mut().enumerate() {
            *out = self.bias(group);
        }
        for (feature, row) in self.coefficients().outer_iter().enumerate() {
            let x = features.get(feature).copied().unwrap_or(0.0);
            for (out, &w) in output.iter_mut().zip(row.iter()) {
                *out += w * x;
            }
        }
    }

    /// Predict margins for a single row.
    pub fn predict_row(&self, features: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; self.n_groups()];
        self.predict_row_into(features, &mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn accessors() {
        let model = LinearModel::from_array(
            array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6], [0.7, 0.8]],
            vec![0.0; 3],
        );
        assert_eq!(model.n_features(), 3);
        assert_eq!(model.n_groups(), 2);
        assert_eq!(model.weight(1, 1), 0.4);
        assert_eq!(model.bias(0), 0.7);
        assert_eq!(model.biases().to_vec(), vec![0.7, 0.8]);
        assert_eq!(model.coefficients().nrows(), 3);
    }

    #[test]
    fn from_flat_checks_shape() {
        let model = LinearModel::from_flat(vec![1.0, 2.0, 3.0], vec![0.0, 0.0], 2, 1).unwrap();
        assert_eq!(model.bias(0), 3.0);
        assert_eq!(model.to_flat(), vec![1.0, 2.0, 3.0]);

        assert!(LinearModel::from_flat(vec![1.0, 2.0], vec![0.0, 0.0], 2, 1).is_none());
        assert!(LinearModel::from_flat(vec![1.0, 2.0, 3.0], vec![0.0], 2, 1).is_none());
        assert!(LinearModel::from_flat(vec![], vec![], 0, 0).is_none());
    }

    #[test]
    fn predict_multigroup() {
        // y0 = 1*x0 + 2*x1 + 0.5, y1 = -1*x0 + 0*x1 - 0.5
        let model = LinearModel::from_array(
            array![[1.0, -1.0], [2.0, 0.0], [0.5, -0.5]],
            vec![0.0, 0.0],
        );
        let out = model.predict_row(&[3.0, 4.0]);
        assert_abs_diff_eq!(out[0], 11.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], -3.5, epsilon = 1e-6);
    }
}
