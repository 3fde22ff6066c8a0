//! From a feature row to a task-specific output.

use std::collections::BTreeMap;

use super::{
    BinaryClassificationPredictOutput, FeatureContributions,
    MulticlassClassificationPredictOutput, PredictOptions, PredictOutput,
    RegressionPredictOutput,
};
use crate::explainability::{explain, regroup};
use crate::features::FeaturePipeline;
use crate::inference::{InnerModel, OutputTransform};
use crate::model::TaskKind;

/// Everything needed to turn inputs into outputs for one model.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    pub task: &'a TaskKind,
    pub pipeline: &'a FeaturePipeline,
    pub inner: &'a InnerModel,
}

impl Predictor<'_> {
    /// Predict from an already computed feature row.
    pub fn predict_features(&self, features: &[f32], options: &PredictOptions) -> PredictOutput {
        let margins = self.inner.margins(features);
        let contributions = options
            .compute_feature_contributions
            .then(|| self.contributions(features));

        match self.task {
            TaskKind::Regression => RegressionPredictOutput {
                value: margins[0],
                feature_contributions: contributions.and_then(|c| c.into_iter().next()),
            }
            .into(),

            TaskKind::BinaryClassification {
                negative_class,
                positive_class,
            } => {
                let mut probabilities = margins;
                OutputTransform::Sigmoid.transform_row(&mut probabilities);
                let p = probabilities[0];
                let (class_name, probability) = if p >= options.threshold {
                    (positive_class.clone(), p)
                } else {
                    (negative_class.clone(), 1.0 - p)
                };
                BinaryClassificationPredictOutput {
                    class_name,
                    probability,
                    feature_contributions: contributions.and_then(|c| c.into_iter().next()),
                }
                .into()
            }

            TaskKind::MulticlassClassification { classes } => {
                let mut probabilities = margins;
                OutputTransform::Softmax.transform_row(&mut probabilities);
                let best = argmax(&probabilities);
                MulticlassClassificationPredictOutput {
                    class_name: classes[best].clone(),
                    probability: probabilities[best],
                    probabilities: classes.iter().cloned().zip(probabilities).collect(),
                    feature_contributions: contributions
                        .map(|c| classes.iter().cloned().zip(c).collect::<BTreeMap<_, _>>()),
                }
                .into()
            }
        }
    }

    /// Labelled contributions for every output group.
    fn contributions(&self, features: &[f32]) -> Vec<FeatureContributions> {
        explain(self.inner, features)
            .iter()
            .map(|group| regroup(self.pipeline, features, group))
            .collect()
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max {
                (i, v)
            } else {
                (best, max)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Column, ColumnKind, FeatureGroup};
    use crate::repr::LinearModel;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn pipeline() -> FeaturePipeline {
        FeaturePipeline::new(
            vec![Column::new("x", ColumnKind::Number)],
            vec![FeatureGroup::Identity {
                source_column: "x".into(),
            }],
        )
        .unwrap()
    }

    fn binary_task() -> TaskKind {
        TaskKind::BinaryClassification {
            negative_class: "no".into(),
            positive_class: "yes".into(),
        }
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn regression_returns_margin() {
        let pipeline = pipeline();
        let inner = InnerModel::Linear(LinearModel::from_array(array![[2.0], [1.0]], vec![0.0]));
        let predictor = Predictor {
            task: &TaskKind::Regression,
            pipeline: &pipeline,
            inner: &inner,
        };
        let output = predictor.predict_features(&[3.0], &PredictOptions::default());
        assert_eq!(
            output,
            PredictOutput::Regression(RegressionPredictOutput {
                value: 7.0,
                feature_contributions: None
            })
        );
    }

    #[test]
    fn binary_threshold_picks_class() {
        let pipeline = pipeline();
        // margin 0 → p = 0.5
        let inner = InnerModel::Linear(LinearModel::from_array(array![[1.0], [0.0]], vec![0.0]));
        let task = binary_task();
        let predictor = Predictor {
            task: &task,
            pipeline: &pipeline,
            inner: &inner,
        };

        let at_threshold = predictor.predict_features(&[0.0], &PredictOptions::default());
        let PredictOutput::BinaryClassification(output) = at_threshold else {
            panic!("expected a binary output");
        };
        assert_eq!(output.class_name, "yes");
        assert_abs_diff_eq!(output.probability, 0.5);

        let strict = PredictOptions::builder().threshold(0.6).build().unwrap();
        let PredictOutput::BinaryClassification(output) =
            predictor.predict_features(&[0.0], &strict)
        else {
            panic!("expected a binary output");
        };
        assert_eq!(output.class_name, "no");
        assert_abs_diff_eq!(output.probability, 0.5);
    }

    #[test]
    fn multiclass_reports_all_probabilities_and_contributions() {
        let pipeline = pipeline();
        let inner = InnerModel::Linear(LinearModel::from_array(
            array![[1.0, 0.0, -1.0], [0.0, 0.5, 0.0]],
            vec![0.0],
        ));
        let task = TaskKind::MulticlassClassification {
            classes: vec!["a".into(), "b".into(), "c".into()],
        };
        let predictor = Predictor {
            task: &task,
            pipeline: &pipeline,
            inner: &inner,
        };
        let options = PredictOptions::builder()
            .compute_feature_contributions(true)
            .build()
            .unwrap();

        let PredictOutput::MulticlassClassification(output) =
            predictor.predict_features(&[2.0], &options)
        else {
            panic!("expected a multiclass output");
        };
        assert_eq!(output.class_name, "a");
        let total: f32 = output.probabilities.values().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);
        assert_eq!(output.probability, output.probabilities["a"]);

        let contributions = output.feature_contributions.unwrap();
        assert_eq!(contributions.len(), 3);
        assert_abs_diff_eq!(contributions["a"].output_value, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(contributions["b"].output_value, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(contributions["c"].output_value, -2.0, epsilon = 1e-6);
    }
}
