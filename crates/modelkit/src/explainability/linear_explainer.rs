//! Linear SHAP explainer for linear models.
//!
//! SHAP values for linear models have a closed-form solution:
//! shap[i] = weight[i] * (x[i] - mean[i])

use super::GroupContributions;
use crate::repr::LinearModel;

/// Linear SHAP explainer using the model's training means as background.
pub struct LinearExplainer<'a> {
    model: &'a LinearModel,
}

impl<'a> LinearExplainer<'a> {
    pub fn new(model: &'a LinearModel) -> Self {
        Self { model }
    }

    /// Get the expected value (base value) for an output group.
    ///
    /// For linear models: `E[f(x)] = sum(w[i] * mean[i]) + bias`
    pub fn base_value(&self, group: usize) -> f32 {
        let coefficients = self.model.coefficients();
        self.model
            .means()
            .iter()
            .enumerate()
            .fold(self.model.bias(group), |acc, (feature, &mean)| {
                acc + coefficients[[feature, group]] * mean
            })
    }

    /// Contributions of every feature to every output group for one row.
    pub fn contributions(&self, features: &[f32]) -> Vec<GroupContributions> {
        let coefficients = self.model.coefficients();
        let means = self.model.means();
        let margins = self.model.predict_row(features);

        margins
            .into_iter()
            .enumerate()
            .map(|(group, margin)| {
                let baseline = self.base_value(group);
                let values: Vec<f32> = means
                    .iter()
                    .enumerate()
                    .map(|(feature, &mean)| {
                        let x = features.get(feature).copied().unwrap_or(0.0);
                        coefficients[[feature, group]] * (x - mean)
                    })
                    .collect();
                GroupContributions::new(baseline, margin, values)
            })
            .collect()
    }
}
