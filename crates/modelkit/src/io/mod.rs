//! I/O module for model serialization and deserialization.
//!
//! This module provides the native `.mkit` container and its JSON twin.
//!
//! # Feature Flags
//!
//! - `storage-compression`: Adds zstd compression for large payloads

pub mod convert;
pub mod native;
pub mod payload;

pub use convert::{ModelFile, ModelParts, ValidationError};

pub use native::{
    DeserializeError, FormatFlags, FormatHeader, ModelKind, NativeCodec, SerializeError,
    CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, MAGIC,
};

pub use payload::{
    BagOfWordsTokenPayload, ColumnKindPayload, ColumnPayload, FeatureGroupPayload,
    ForestPayload, InnerModelPayload, LinearPayload, Payload, PayloadV1, TaskPayload,
    TokenPayload, TokenizerPayload, TreePayload,
};
