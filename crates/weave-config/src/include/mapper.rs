//! Include mapping: raw directives in, resolved files out.
//!
//! Stages run in a fixed order, each over the whole list:
//! normalize, rules, project fan-out, wildcards, variables, duplicate
//! guard, classification. Any error aborts the whole call.

use tracing::{debug, warn};

use super::expand_set::ScopedLocation;
use super::file::select_first_matching;
use super::location::{FileSpec, RawInclude, is_valid_url};
use super::{Context, FileAccessor, Location};
use crate::ConfigResult;

/// Resolve `includes` into files, in declaration order.
pub fn resolve(includes: &[RawInclude], ctx: &Context) -> ConfigResult<Vec<FileAccessor>> {
    if includes.is_empty() {
        return Ok(Vec::new());
    }

    ctx.instrument("config_mapper_process", || -> ConfigResult<Vec<FileAccessor>> {
        debug!(
            expansion = %ctx.expand_set().id(),
            scope = %ctx.scope(),
            count = includes.len(),
            "Resolving includes"
        );

        let locations: Vec<Location> = includes
            .iter()
            .map(|raw| normalize_location(raw, ctx))
            .collect();

        let mut active = Vec::with_capacity(locations.len());
        for location in locations {
            if let Some(location) = verify_rules(location, ctx)? {
                active.push(location);
            }
        }

        let mut expanded = Vec::with_capacity(active.len());
        for location in active.into_iter().flat_map(expand_project_files) {
            expanded.extend(expand_wildcard_paths(location, ctx)?);
        }

        let resolved: Vec<Location> = expanded
            .into_iter()
            .map(|location| expand_variables(location, ctx))
            .collect();

        for location in &resolved {
            verify_duplicates(location, ctx)?;
        }

        resolved
            .into_iter()
            .map(|location| {
                ctx.instrument("config_mapper_select", || {
                    select_first_matching(location, ctx)
                })
            })
            .collect()
    })
}

/// Convert a raw entry to its canonical record.
pub fn normalize_location(raw: &RawInclude, ctx: &Context) -> Location {
    ctx.instrument("config_mapper_normalize", || match raw {
        RawInclude::Path(path) => {
            let path = ctx.instrument("config_mapper_variables", || ctx.variables().expand(path));
            if is_valid_url(&path) {
                Location::remote(path)
            } else {
                Location::local(path)
            }
        }
        RawInclude::Record(location) => location.clone(),
    })
}

/// Keep `location` only if its rules pass. No rules always passes.
pub fn verify_rules(location: Location, ctx: &Context) -> ConfigResult<Option<Location>> {
    ctx.instrument("config_mapper_rules", || -> ConfigResult<Option<Location>> {
        if location.rules.is_none() {
            return Ok(Some(location));
        }

        let rules = location.rules.as_deref().unwrap_or_default();

        let outcome = ctx.rule_evaluator().evaluate(rules, ctx)?;
        if outcome.is_pass() {
            Ok(Some(location))
        } else {
            debug!(location = %location.to_json(), "Include skipped by rules");
            Ok(None)
        }
    })
}

/// One location per file of a project include.
pub fn expand_project_files(location: Location) -> Vec<Location> {
    if location.project.is_none() {
        return vec![location];
    }

    // Without any file the location is kept so the classifier rejects it.
    let paths = match &location.file {
        Some(files) => files.paths(),
        None => Vec::new(),
    };
    if paths.is_empty() {
        return vec![location];
    }

    paths
        .into_iter()
        .map(|file| Location {
            file: Some(FileSpec::One(file.to_string())),
            ..location.clone()
        })
        .collect()
}

/// One `local` location per repository path matching a wildcard.
pub fn expand_wildcard_paths(location: Location, ctx: &Context) -> ConfigResult<Vec<Location>> {
    ctx.instrument("config_mapper_wildcards", || -> ConfigResult<Vec<Location>> {
        if !location.is_wildcard() {
            return Ok(vec![location]);
        }

        let (project, revision) = (ctx.project(), ctx.revision());
        let pattern = location.local.as_deref().unwrap_or_default();
        let paths = ctx
            .repository()
            .search_files_by_wildcard_path(project, pattern, revision)?;

        if paths.is_empty() {
            warn!(
                pattern,
                project = %project,
                revision = %revision,
                "Wildcard include matched no files"
            );
        } else {
            debug!(pattern, matches = paths.len(), "Expanded wildcard include");
        }

        Ok(paths.into_iter().map(Location::local).collect())
    })
}

/// Interpolate every string field of `location`; rules are left as written.
pub fn expand_variables(location: Location, ctx: &Context) -> Location {
    ctx.instrument("config_mapper_variables", || {
        let vars = ctx.variables();
        let expand = |value: Option<String>| value.map(|v| vars.expand(&v));

        Location {
            local: expand(location.local),
            remote: expand(location.remote),
            template: expand(location.template),
            project: expand(location.project),
            artifact: expand(location.artifact),
            job: expand(location.job),
            file: location.file.map(|file| match file {
                FileSpec::One(path) => FileSpec::One(vars.expand(&path)),
                FileSpec::Many(paths) => FileSpec::Many(vars.expand_vec(&paths)),
            }),
            ref_name: expand(location.ref_name),
            rules: location.rules,
        }
    })
}

/// Record `location` in the shared expansion set under the current scope.
pub fn verify_duplicates(location: &Location, ctx: &Context) -> ConfigResult<()> {
    ctx.instrument("config_mapper_verify", || {
        // Scoping by project and revision keeps the same relative path in
        // another project, or at another revision, from colliding.
        ctx.expand_set().insert(ScopedLocation {
            location: location.clone(),
            project: ctx.project().clone(),
            revision: ctx.revision().clone(),
        })
    })
}
