//! Include resolution for Weave CI configurations.
//!
//! This crate handles:
//! - Reading `include` directives from KDL and JSON pipeline documents
//! - Resolving them into typed file descriptors
//! - Variable interpolation
//! - Per-stage instrumentation

pub mod error;
pub mod include;
pub mod instrument;
pub mod pipeline;
pub mod variables;

pub use error::{ConfigError, ConfigResult};
pub use include::{
    Context, ContextBuilder, ExpandSet, FileAccessor, Location, MAX_INCLUDES, RawInclude, Scope,
    resolve,
};
pub use instrument::Instrumentation;
pub use variables::Variables;
