//! Regrouping per-feature values into labelled contribution entries.

use super::GroupContributions;
use crate::features::{FeatureGroup, FeaturePipeline};
use crate::predict::{FeatureContribution, FeatureContributions};

/// Label the raw contributions of one output group.
///
/// `features` is the row that was explained and `contributions.values` has
/// one value per feature in pipeline layout. Entries come out in feature
/// order.
pub fn regroup(
    pipeline: &FeaturePipeline,
    features: &[f32],
    contributions: &GroupContributions,
) -> FeatureContributions {
    let mut entries = Vec::with_capacity(pipeline.n_features());

    for (group_idx, group) in pipeline.groups().iter().enumerate() {
        let range = pipeline.group_range(group_idx);
        let values = &contributions.values[range.clone()];
        let group_features = &features[range];
        let column_name = group.source_column();

        match group {
            FeatureGroup::Identity { .. } => entries.push(FeatureContribution::Identity {
                column_name: column_name.to_string(),
                feature_value: group_features[0],
                feature_contribution_value: values[0],
            }),
            FeatureGroup::Normalized { .. } => entries.push(FeatureContribution::Normalized {
                column_name: column_name.to_string(),
                feature_value: group_features[0],
                feature_contribution_value: values[0],
            }),
            FeatureGroup::OneHotEncoded { options, .. } => {
                let labels = std::iter::once(None).chain(options.iter().cloned().map(Some));
                for ((option, &feature), &value) in labels.zip(group_features).zip(values) {
                    entries.push(FeatureContribution::OneHotEncoded {
                        column_name: column_name.to_string(),
                        option,
                        feature_value: feature > 0.0,
                        feature_contribution_value: value,
                    });
                }
            }
            FeatureGroup::BagOfWords(bag) => {
                let hits = bag.tokens().iter().zip(group_features).zip(values);
                for ((entry, &feature), &value) in hits {
                    entries.push(FeatureContribution::BagOfWords {
                        column_name: column_name.to_string(),
                        token: entry.token.clone(),
                        feature_value: feature > 0.0,
                        feature_contribution_value: value,
                    });
                }
            }
        }
    }

    FeatureContributions {
        baseline_value: contributions.baseline,
        output_value: contributions.output,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{
        BagOfWordsFeatureGroup, BagOfWordsToken, Column, ColumnKind, Token, Tokenizer,
    };

    fn pipeline() -> FeaturePipeline {
        FeaturePipeline::new(
            vec![
                Column::new("age", ColumnKind::Number),
                Column::new(
                    "color",
                    ColumnKind::Enum {
                        options: vec!["red".into(), "blue".into()],
                    },
                ),
                Column::new("notes", ColumnKind::Text),
            ],
            vec![
                FeatureGroup::Identity {
                    source_column: "age".into(),
                },
                FeatureGroup::OneHotEncoded {
                    source_column: "color".into(),
                    options: vec!["red".into(), "blue".into()],
                },
                FeatureGroup::BagOfWords(
                    BagOfWordsFeatureGroup::new(
                        "notes",
                        Tokenizer::Alphanumeric,
                        vec![BagOfWordsToken {
                            token: Token::Unigram("pain".into()),
                            idf: 1.0,
                        }],
                    )
                    .unwrap(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn one_entry_per_feature_in_layout_order() {
        let pipeline = pipeline();
        let features = [40.0, 0.0, 1.0, 0.0, 0.0];
        let contributions = GroupContributions::new(0.5, 0.5, vec![0.1, 0.0, 0.2, -0.3, 0.0]);

        let result = regroup(&pipeline, &features, &contributions);
        assert_eq!(result.entries.len(), 5);
        assert_eq!(result.baseline_value, 0.5);

        assert_eq!(
            result.entries[0],
            FeatureContribution::Identity {
                column_name: "age".into(),
                feature_value: 40.0,
                feature_contribution_value: 0.1,
            }
        );
        assert_eq!(
            result.entries[1],
            FeatureContribution::OneHotEncoded {
                column_name: "color".into(),
                option: None,
                feature_value: false,
                feature_contribution_value: 0.0,
            }
        );
        assert_eq!(
            result.entries[2],
            FeatureContribution::OneHotEncoded {
                column_name: "color".into(),
                option: Some("red".into()),
                feature_value: true,
                feature_contribution_value: 0.2,
            }
        );
        assert!(matches!(
            &result.entries[4],
            FeatureContribution::BagOfWords { token: Token::Unigram(t), feature_value: false, .. }
                if t == "pain"
        ));

        let total: f32 = result
            .entries
            .iter()
            .map(FeatureContribution::feature_contribution_value)
            .sum();
        assert!((result.baseline_value + total - result.output_value).abs() < 1e-6);
    }
}
