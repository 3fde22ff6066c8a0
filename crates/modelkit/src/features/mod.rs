//! Feature engineering: from key-value input records to model features.
//!
//! - [`column`]: column kinds and coercion of raw values
//! - [`group`]: feature groups (identity, normalized, one-hot, bag-of-words)
//! - [`tokenizer`]: the alphanumeric text tokenizer
//! - [`compute`]: the column + group pipeline producing a feature row

pub mod column;
pub mod compute;
pub mod group;
pub mod tokenizer;

pub use column::{Column, ColumnKind, ColumnValue};
pub use compute::{FeaturePipeline, FeatureValidationError};
pub use group::{BagOfWordsFeatureGroup, BagOfWordsToken, FeatureGroup, Tokenizer};
pub use tokenizer::{AlphanumericTokenizer, Token};
