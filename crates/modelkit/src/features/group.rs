//! Feature groups: rules that turn one column value into model features.

use super::column::ColumnValue;
use super::tokenizer::{unigrams_and_bigrams, Token};

/// Tokenizer used by a bag-of-words group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tokenizer {
    #[default]
    Alphanumeric,
}

/// Vocabulary entry of a bag-of-words group.
#[derive(Debug, Clone, PartialEq)]
pub struct BagOfWordsToken {
    pub token: Token,
    pub idf: f32,
}

/// TF-IDF features over a fixed vocabulary.
///
/// Feature `i` belongs to `tokens[i]`. Lookups go through a sorted index so
/// the vocabulary order stays the feature order.
#[derive(Debug, Clone)]
pub struct BagOfWordsFeatureGroup {
    source_column: String,
    tokenizer: Tokenizer,
    tokens: Vec<BagOfWordsToken>,
    sorted: Vec<(Token, usize)>,
}

impl BagOfWordsFeatureGroup {
    /// Build a group, returning the first duplicated token on failure.
    pub fn new(
        source_column: impl Into<String>,
        tokenizer: Tokenizer,
        tokens: Vec<BagOfWordsToken>,
    ) -> Result<Self, Token> {
        let mut sorted: Vec<(Token, usize)> = tokens
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.token.clone(), i))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(pair[0].0.clone());
        }

        Ok(Self {
            source_column: source_column.into(),
            tokenizer,
            tokens,
            sorted,
        })
    }

    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    pub fn tokens(&self) -> &[BagOfWordsToken] {
        &self.tokens
    }

    /// Feature index of a token, if it is in the vocabulary.
    pub fn token_index(&self, token: &Token) -> Option<usize> {
        self.sorted
            .binary_search_by(|(t, _)| t.cmp(token))
            .ok()
            .map(|i| self.sorted[i].1)
    }

    /// Write features for `text` into `out` (one slot per token).
    ///
    /// Every occurrence of a vocabulary unigram or bigram adds its idf. The
    /// result is divided by the root of the summed squared per-occurrence
    /// values when any token matched.
    pub fn compute(&self, text: &str, out: &mut [f32]) {
        out.fill(0.0);
        let mut sum_of_squares = 0.0f32;
        let tokens = match self.tokenizer {
            Tokenizer::Alphanumeric => unigrams_and_bigrams(text),
        };
        for token in tokens {
            if let Some(index) = self.token_index(&token) {
                let value = self.tokens[index].idf;
                sum_of_squares += value * value;
                out[index] += value;
            }
        }
        if sum_of_squares > 0.0 {
            let norm = sum_of_squares.sqrt();
            for value in out.iter_mut() {
                *value /= norm;
            }
        }
    }
}

/// A rule deriving features from one source column.
#[derive(Debug, Clone)]
pub enum FeatureGroup {
    /// One feature: the number, or the enum index (0 = missing).
    Identity { source_column: String },
    /// One feature: `(value - mean) / sqrt(variance)`, 0 when missing or
    /// when the variance is zero.
    Normalized {
        source_column: String,
        mean: f32,
        variance: f32,
    },
    /// `options.len() + 1` features: slot 0 flags a missing or unknown
    /// value, slot `i + 1` flags option `i`.
    OneHotEncoded {
        source_column: String,
        options: Vec<String>,
    },
    /// One feature per vocabulary token.
    BagOfWords(BagOfWordsFeatureGroup),
}

impl FeatureGroup {
    /// Name of the column this group reads.
    pub fn source_column(&self) -> &str {
        match self {
            FeatureGroup::Identity { source_column }
            | FeatureGroup::Normalized { source_column, .. }
            | FeatureGroup::OneHotEncoded { source_column, .. } => source_column,
            FeatureGroup::BagOfWords(group) => group.source_column(),
        }
    }

    /// Number of features this group produces.
    pub fn n_features(&self) -> usize {
        match self {
            FeatureGroup::Identity { .. } | FeatureGroup::Normalized { .. } => 1,
            FeatureGroup::OneHotEncoded { options, .. } => options.len() + 1,
            FeatureGroup::BagOfWords(group) => group.tokens().len(),
        }
    }

    /// Write this group's features for `value` into `out`.
    ///
    /// `out.len()` must equal [`FeatureGroup::n_features`]. Values of the
    /// wrong kind produce missing features.
    pub fn compute(&self, value: &ColumnValue<'_>, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.n_features());
        match self {
            FeatureGroup::Identity { .. } => out[0] = value.as_feature(),
            FeatureGroup::Normalized { mean, variance, .. } => {
                let x = value.as_feature();
                out[0] = if x.is_nan() || *variance == 0.0 {
                    0.0
                } else {
                    (x - mean) / variance.sqrt()
                };
            }
            FeatureGroup::OneHotEncoded { .. } => {
                out.fill(0.0);
                let index = match value {
                    ColumnValue::Enum(index) if *index < out.len() => *index,
                    _ => 0,
                };
                out[index] = 1.0;
            }
            FeatureGroup::BagOfWords(group) => match value {
                ColumnValue::Text(text) => group.compute(text, out),
                _ => out.fill(0.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vocabulary() -> BagOfWordsFeatureGroup {
        let entry = |token: Token, idf: f32| BagOfWordsToken { token, idf };
        BagOfWordsFeatureGroup::new(
            "title",
            Tokenizer::Alphanumeric,
            vec![
                entry(Token::Unigram("the".into()), 1.0),
                entry(Token::Unigram("little".into()), 2.0),
                entry(Token::Bigram("little".into(), "prince".into()), 3.0),
                entry(Token::Unigram("cat".into()), 4.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn normalized() {
        let group = FeatureGroup::Normalized {
            source_column: "age".into(),
            mean: 50.0,
            variance: 100.0,
        };
        let mut out = [0.0];
        group.compute(&ColumnValue::Number(70.0), &mut out);
        assert_abs_diff_eq!(out[0], 2.0);
        group.compute(&ColumnValue::Number(f32::NAN), &mut out);
        assert_eq!(out[0], 0.0);

        let flat = FeatureGroup::Normalized {
            source_column: "age".into(),
            mean: 50.0,
            variance: 0.0,
        };
        flat.compute(&ColumnValue::Number(70.0), &mut out);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn one_hot_reserves_missing_slot() {
        let group = FeatureGroup::OneHotEncoded {
            source_column: "color".into(),
            options: vec!["red".into(), "green".into()],
        };
        assert_eq!(group.n_features(), 3);

        let mut out = [9.0; 3];
        group.compute(&ColumnValue::Enum(2), &mut out);
        assert_eq!(out, [0.0, 0.0, 1.0]);
        group.compute(&ColumnValue::Enum(0), &mut out);
        assert_eq!(out, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn identity_passes_enum_index() {
        let group = FeatureGroup::Identity {
            source_column: "color".into(),
        };
        let mut out = [0.0];
        group.compute(&ColumnValue::Enum(2), &mut out);
        assert_eq!(out[0], 2.0);
    }

    #[test]
    fn bag_of_words_lookup_keeps_vocabulary_order() {
        let group = vocabulary();
        assert_eq!(group.token_index(&Token::Unigram("cat".into())), Some(3));
        assert_eq!(
            group.token_index(&Token::Bigram("little".into(), "prince".into())),
            Some(2)
        );
        assert_eq!(group.token_index(&Token::Unigram("dog".into())), None);
    }

    #[test]
    fn bag_of_words_weights_and_normalizes() {
        let group = vocabulary();
        let mut out = [0.0; 4];
        group.compute("The Little Prince", &mut out);

        // Hits: the (1), little (2), little prince (3).
        let norm = (1.0f32 + 4.0 + 9.0).sqrt();
        assert_abs_diff_eq!(out[0], 1.0 / norm, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 2.0 / norm, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 3.0 / norm, epsilon = 1e-6);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn bag_of_words_repeated_tokens_accumulate() {
        let group = vocabulary();
        let mut out = [0.0; 4];
        group.compute("cat cat", &mut out);
        // Two hits of idf 4: value 8, norm sqrt(16 + 16).
        assert_abs_diff_eq!(out[3], 8.0 / 32f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn bag_of_words_no_hits_is_zero() {
        let group = vocabulary();
        let mut out = [5.0; 4];
        group.compute("", &mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn bag_of_words_rejects_duplicates() {
        let token = Token::Unigram("the".into());
        let result = BagOfWordsFeatureGroup::new(
            "title",
            Tokenizer::Alphanumeric,
            vec![
                BagOfWordsToken { token: token.clone(), idf: 1.0 },
                BagOfWordsToken { token: token.clone(), idf: 2.0 },
            ],
        );
        assert_eq!(result.err(), Some(token));
    }
}
