//! CLI command implementations.

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use weave_config::include::{ResolvedFile, process};
use weave_config::pipeline::parse_includes;
use weave_config::{Context, ExpandSet, FileAccessor, Instrumentation, Variables};
use weave_core::RepositorySearch;

use crate::tree::WorkingTree;

pub struct ResolveOptions {
    pub root: PathBuf,
    pub path: String,
    pub project: String,
    pub revision: String,
    pub variables: Vec<(String, String)>,
    pub recursive: bool,
    pub json: bool,
    pub timings: bool,
    pub max_includes: usize,
}

/// Resolve a configuration file's includes against a working tree.
pub fn resolve(options: &ResolveOptions) -> Result<()> {
    let config_path = options.root.join(&options.path);
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let includes = parse_includes(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
    debug!(path = %config_path.display(), includes = includes.len(), "Parsed config file");

    let tree = Arc::new(WorkingTree::new(&options.root));
    let repository: Arc<dyn RepositorySearch> = tree.clone();
    let instrumentation = Arc::new(Instrumentation::new());

    let mut variables = Variables::new()
        .with("CI_PROJECT_PATH", options.project.as_str())
        .with("CI_COMMIT_SHA", options.revision.as_str());
    for (name, value) in &options.variables {
        variables.set(name.as_str(), value.as_str());
    }

    let ctx = Context::builder(options.project.as_str(), options.revision.as_str())
        .with_variables(variables)
        .with_shared_repository(repository)
        .with_expand_set(Arc::new(ExpandSet::with_limit(options.max_includes)))
        .with_instrumentation(Arc::clone(&instrumentation))
        .build();

    let resolved: Vec<ResolvedFile> = if options.recursive {
        process(&includes, &ctx, tree.as_ref())?
    } else {
        weave_config::resolve(&includes, &ctx)?
            .into_iter()
            .map(|file| ResolvedFile {
                file,
                content: String::new(),
                depth: 0,
            })
            .collect()
    };

    info!(
        project = %options.project,
        revision = %options.revision,
        files = resolved.len(),
        recursive = options.recursive,
        "Resolved includes"
    );

    if options.json {
        let files: Vec<&FileAccessor> = resolved.iter().map(|r| &r.file).collect();
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else if resolved.is_empty() {
        println!("No includes");
    } else {
        for entry in &resolved {
            println!(
                "{}{:<9} {}",
                "  ".repeat(entry.depth),
                entry.file.kind(),
                entry.file
            );
        }
    }

    if options.timings {
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&instrumentation.observations())?
        );
    }

    Ok(())
}

/// Check that a configuration file's include directives parse.
pub fn validate(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    match parse_includes(&content) {
        Ok(includes) => {
            println!("Configuration is valid ({} includes)", includes.len());
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}
