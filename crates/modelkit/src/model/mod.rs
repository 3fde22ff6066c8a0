//! High-level model API.
//!
//! - [`Model`]: a loaded model that predicts and reports events
//! - [`LoadModelOptions`]: load-time configuration
//! - [`ModelMeta`] / [`TaskKind`]: introspection

mod loaded;
mod meta;
mod options;

pub use loaded::Model;
pub use meta::{ModelMeta, TaskKind};
pub use options::{LoadError, LoadModelOptions, DEFAULT_BASE_URL};
