//! Recursive include processing.
//!
//! Resolves a file's includes, fetches each resolved file, and resolves the
//! includes found inside it, depth first.

use serde::Serialize;
use tracing::info;

use super::{Context, FileAccessor, RawInclude, Scope, resolve};
use crate::pipeline::parse_includes;
use crate::{ConfigError, ConfigResult};

/// Retrieves the content of a resolved include.
pub trait FileFetcher: Send + Sync {
    fn fetch(&self, file: &FileAccessor) -> weave_core::Result<FetchedFile>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub content: String,
    /// Scope the includes inside this file are resolved in.
    pub scope: Scope,
}

impl FetchedFile {
    pub fn new(content: impl Into<String>, scope: Scope) -> Self {
        Self {
            content: content.into(),
            scope,
        }
    }
}

/// A fetched include and how deep in the include tree it was found.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFile {
    pub file: FileAccessor,
    pub content: String,
    pub depth: usize,
}

/// Resolve `includes` and everything they include, in pre-order.
pub fn process(
    includes: &[RawInclude],
    ctx: &Context,
    fetcher: &dyn FileFetcher,
) -> ConfigResult<Vec<ResolvedFile>> {
    let mut resolved = Vec::new();
    process_into(includes, ctx, fetcher, 0, &mut resolved)?;
    Ok(resolved)
}

fn process_into(
    includes: &[RawInclude],
    ctx: &Context,
    fetcher: &dyn FileFetcher,
    depth: usize,
    resolved: &mut Vec<ResolvedFile>,
) -> ConfigResult<()> {
    for file in resolve(includes, ctx)? {
        let fetched = fetcher.fetch(&file).map_err(|source| ConfigError::Fetch {
            file: file.to_string(),
            source,
        })?;
        let nested = parse_includes(&fetched.content)?;

        info!(
            expansion = %ctx.expand_set().id(),
            file = %file,
            depth,
            nested = nested.len(),
            "Included file"
        );

        let nested_ctx = ctx.nested(fetched.scope);
        resolved.push(ResolvedFile {
            file,
            content: fetched.content,
            depth,
        });
        process_into(&nested, &nested_ctx, fetcher, depth + 1, resolved)?;
    }
    Ok(())
}
