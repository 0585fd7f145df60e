//! Include directive resolution.
//!
//! [`resolve`] turns the `include` entries of one configuration file into
//! typed [`FileAccessor`]s. Files discovered while fetching those accessors
//! are resolved again with [`Context::nested`], sharing one [`ExpandSet`]
//! so cycles and runaway fan-out are caught across the whole tree.

pub mod context;
pub mod expand_set;
pub mod file;
pub mod location;
pub mod mapper;
pub mod processor;
pub mod rules;

pub use context::{Context, ContextBuilder, Scope};
pub use expand_set::{ExpandSet, MAX_INCLUDES, ScopedLocation};
pub use file::{FileAccessor, FileKind, Origin};
pub use location::{FileSpec, Location, RawInclude};
pub use mapper::resolve;
pub use processor::{FetchedFile, FileFetcher, ResolvedFile, process};
pub use rules::{ExpressionRuleEvaluator, RuleEvaluator};
