//! End-to-end predictions on the fixture models.

use modelkit::io::{ModelFile, PayloadV1};
use modelkit::testing::{
    assert_contributions_explain, fixtures, RecordingSink, DEFAULT_TOLERANCE,
};
use modelkit::{
    assert_approx_eq, FeatureContribution, Model, PredictInput, PredictOptions, PredictOutput,
};
use proptest::prelude::*;
use rstest::rstest;

fn model(payload: PayloadV1) -> Model {
    let parts = ModelFile::new(payload).into_parts().expect("valid fixture");
    Model::from_parts(parts, Box::new(RecordingSink::new()), 1)
}

fn with_contributions() -> PredictOptions {
    PredictOptions::builder()
        .compute_feature_contributions(true)
        .build()
        .unwrap()
}

fn binary(output: PredictOutput) -> modelkit::BinaryClassificationPredictOutput {
    match output {
        PredictOutput::BinaryClassification(output) => output,
        other => panic!("expected binary output, got {other:?}"),
    }
}

fn multiclass(output: PredictOutput) -> modelkit::MulticlassClassificationPredictOutput {
    match output {
        PredictOutput::MulticlassClassification(output) => output,
        other => panic!("expected multiclass output, got {other:?}"),
    }
}

// =============================================================================
// Binary classification
// =============================================================================

#[test]
fn tree_binary_prediction() {
    let model = model(fixtures::heart_disease_tree());
    let output = binary(model.predict_one(&fixtures::heart_disease_input(63.0), None));

    // margin = -0.1 + 0.6 + 1.2
    let p = 1.0 / (1.0 + (-1.7f32).exp());
    assert_eq!(output.class_name, "Positive");
    assert_approx_eq!(output.probability, p, DEFAULT_TOLERANCE);
    assert!(output.feature_contributions.is_none());
}

#[test]
fn tree_contributions_explain_the_margin() {
    let model = model(fixtures::heart_disease_tree());
    let output = model.predict_one(&fixtures::heart_disease_input(63.0), Some(&with_contributions()));
    let contributions = output.feature_contributions().expect("contributions");

    // -0.1 + (0.45 * -0.4 + 0.55 * 0.6) + (0.5 * -0.8 + 0.2 * 0.5 + 0.3 * 1.2)
    assert_approx_eq!(contributions.baseline_value, 0.11, 1e-4);
    assert_approx_eq!(contributions.output_value, 1.7, 1e-4);

    // Gender is never split on.
    assert_eq!(contributions.entries[1].column_name(), "gender");
    assert_eq!(contributions.entries[1].feature_contribution_value(), 0.0);
    assert_contributions_explain(model.task(), &[output], 1e-4, "heart_disease_tree");
}

#[test]
fn missing_inputs_follow_default_directions() {
    let model = model(fixtures::heart_disease_tree());
    let output = binary(model.predict_one(&PredictInput::new(), None));

    // margin = -0.1 - 0.4 - 0.8
    let p = 1.0 / (1.0 + (-(-1.3f32)).exp());
    assert_eq!(output.class_name, "Negative");
    assert_approx_eq!(output.probability, 1.0 - p, DEFAULT_TOLERANCE);
}

#[test]
fn numeric_string_in_number_column_is_missing() {
    let model = model(fixtures::heart_disease_tree());
    let mut input = fixtures::heart_disease_input(63.0);
    input.insert("age".into(), "63".into());

    let mut without_age = input.clone();
    without_age.remove("age");
    assert_eq!(
        model.predict_one(&input, None),
        model.predict_one(&without_age, None)
    );
}

#[rstest]
#[case(0.0, "Positive")]
#[case(0.5, "Positive")]
#[case(0.9, "Negative")]
#[case(1.0, "Negative")]
fn threshold_selects_class(#[case] threshold: f32, #[case] expected: &str) {
    let model = model(fixtures::heart_disease_tree());
    let options = PredictOptions::builder().threshold(threshold).build().unwrap();
    let output = binary(model.predict_one(&fixtures::heart_disease_input(63.0), Some(&options)));

    let p = 1.0 / (1.0 + (-1.7f32).exp());
    assert_eq!(output.class_name, expected);
    let reported = if expected == "Positive" { p } else { 1.0 - p };
    assert_approx_eq!(output.probability, reported, DEFAULT_TOLERANCE);
}

#[test]
fn linear_contributions_label_every_feature() {
    let model = model(fixtures::heart_disease_linear());
    let output = model.predict_one(&fixtures::heart_disease_input(70.0), Some(&with_contributions()));
    let contributions = output.feature_contributions().expect("contributions");

    assert_eq!(contributions.entries.len(), 12);
    let columns: Vec<&str> = contributions
        .entries
        .iter()
        .map(FeatureContribution::column_name)
        .collect();
    assert_eq!(columns[0], "age");
    assert!(columns[1..4].iter().all(|c| *c == "gender"));
    assert!(columns[4..9].iter().all(|c| *c == "chest_pain"));
    assert!(columns[9..].iter().all(|c| *c == "notes"));

    match &contributions.entries[2] {
        FeatureContribution::OneHotEncoded {
            option,
            feature_value,
            ..
        } => {
            assert_eq!(option.as_deref(), Some("male"));
            assert!(feature_value);
        }
        other => panic!("expected one-hot contribution, got {other:?}"),
    }
    assert!(contributions.entries[9..].iter().all(|entry| matches!(
        entry,
        FeatureContribution::BagOfWords {
            feature_value: true,
            ..
        }
    )));

    assert_contributions_explain(model.task(), &[output], 1e-4, "heart_disease_linear");
}

// =============================================================================
// Multiclass classification
// =============================================================================

#[rstest]
#[case::setosa([5.1, 3.5, 1.4, 0.2], "Iris Setosa")]
#[case::virginica([6.7, 3.0, 5.2, 2.3], "Iris Virginica")]
fn multiclass_picks_most_probable_class(#[case] measurements: [f64; 4], #[case] expected: &str) {
    let model = model(fixtures::iris_linear());
    let output = multiclass(model.predict_one(&fixtures::iris_input(measurements), None));

    assert_eq!(output.class_name, expected);
    assert_eq!(output.probabilities.len(), 3);
    let total: f32 = output.probabilities.values().sum();
    assert_approx_eq!(total, 1.0, DEFAULT_TOLERANCE);
    assert_eq!(output.probability, output.probabilities[expected]);
    assert!(output
        .probabilities
        .values()
        .all(|&p| p <= output.probability));
}

#[test]
fn multiclass_contributions_cover_every_class() {
    let model = model(fixtures::iris_linear());
    let output = model.predict_one(
        &fixtures::iris_input([5.9, 3.0, 4.2, 1.5]),
        Some(&with_contributions()),
    );

    let by_class = multiclass(output.clone())
        .feature_contributions
        .expect("contributions");
    assert_eq!(by_class.len(), 3);
    assert!(by_class.values().all(|c| c.entries.len() == 4));
    assert_contributions_explain(model.task(), &[output], 1e-4, "iris_linear");
}

// =============================================================================
// Regression
// =============================================================================

#[test]
fn regression_contributions_explain_the_value() {
    let model = model(fixtures::housing_tree());
    let mut input = PredictInput::new();
    input.insert("rooms".into(), 8.0.into());
    input.insert("crime".into(), 3.5.into());

    let output = model.predict_one(&input, Some(&with_contributions()));
    let PredictOutput::Regression(regression) = &output else {
        panic!("expected regression output, got {output:?}");
    };
    // 22.5 + 5.0 + 0.5
    assert_approx_eq!(regression.value, 28.0, DEFAULT_TOLERANCE);

    let contributions = regression.feature_contributions.as_ref().unwrap();
    assert_approx_eq!(contributions.output_value, 28.0, 1e-4);
    assert_contributions_explain(model.task(), &[output], 1e-4, "housing_tree");
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn batch_predictions_keep_input_order() {
    let parts = ModelFile::new(fixtures::heart_disease_tree())
        .into_parts()
        .unwrap();
    let model = Model::from_parts(parts, Box::new(RecordingSink::new()), 4);

    let inputs: Vec<PredictInput> = (0..256)
        .map(|i| fixtures::heart_disease_input(20.0 + (i % 60) as f64))
        .collect();
    let outputs = model.predict(&inputs, Some(&with_contributions()));

    assert_eq!(outputs.len(), inputs.len());
    for (input, output) in inputs.iter().zip(&outputs) {
        assert_eq!(
            &model.predict_one(input, Some(&with_contributions())),
            output
        );
    }
    assert_contributions_explain(model.task(), &outputs, 1e-4, "batch");
}

// =============================================================================
// Properties
// =============================================================================

const WORDS: [&str; 6] = ["chest", "pain", "at", "rest", "CHEST", "ok"];

fn arb_notes() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 0..8)
        .prop_map(|words| words.join(" "))
}

fn arb_input() -> impl Strategy<Value = PredictInput> {
    (
        prop::option::of(0.0f64..100.0),
        prop::sample::select(vec!["male", "female", "unknown"]),
        prop::sample::select(vec!["asymptomatic", "typical angina", "other"]),
        arb_notes(),
    )
        .prop_map(|(age, gender, chest_pain, notes)| {
            let mut input = PredictInput::new();
            if let Some(age) = age {
                input.insert("age".into(), age.into());
            }
            input.insert("gender".into(), gender.into());
            input.insert("chest_pain".into(), chest_pain.into());
            input.insert("notes".into(), notes.into());
            input
        })
}

proptest! {
    #[test]
    fn tree_contributions_explain_the_probability(input in arb_input()) {
        let model = model(fixtures::heart_disease_tree());
        let output = model.predict_one(&input, Some(&with_contributions()));
        assert_contributions_explain(model.task(), &[output], 1e-4, "heart_disease_tree");
    }

    #[test]
    fn linear_contributions_explain_the_probability(input in arb_input()) {
        let model = model(fixtures::heart_disease_linear());
        let output = model.predict_one(&input, Some(&with_contributions()));
        assert_contributions_explain(model.task(), &[output], 1e-4, "heart_disease_linear");
    }

    #[test]
    fn tree_contributions_explain_low_threshold_predictions(input in arb_input()) {
        let model = model(fixtures::heart_disease_tree());
        let options = PredictOptions::builder()
            .threshold(0.1)
            .compute_feature_contributions(true)
            .build()
            .unwrap();
        let output = model.predict_one(&input, Some(&options));
        assert_contributions_explain(model.task(), &[output], 1e-4, "heart_disease_tree");
    }

    #[test]
    fn multiclass_contributions_explain_every_probability(
        measurements in prop::array::uniform4(0.0f64..8.0),
    ) {
        let model = model(fixtures::iris_linear());
        let output = model.predict_one(&fixtures::iris_input(measurements), Some(&with_contributions()));
        assert_contributions_explain(model.task(), &[output], 1e-4, "iris_linear");
    }

    #[test]
    fn regression_contributions_explain_any_value(
        rooms in prop::option::of(3.0f64..9.0),
        crime in prop::option::of(0.0f64..5.0),
    ) {
        let model = model(fixtures::housing_tree());
        let mut input = PredictInput::new();
        if let Some(rooms) = rooms {
            input.insert("rooms".into(), rooms.into());
        }
        if let Some(crime) = crime {
            input.insert("crime".into(), crime.into());
        }
        let output = model.predict_one(&input, Some(&with_contributions()));
        assert_contributions_explain(model.task(), &[output], 1e-4, "housing_tree");
    }

    #[test]
    fn binary_probability_is_at_least_half_under_default_threshold(input in arb_input()) {
        let model = model(fixtures::heart_disease_linear());
        let output = binary(model.predict_one(&input, None));
        prop_assert!(output.probability >= 0.5);
        prop_assert!(output.probability <= 1.0);
    }
}
