//! Repository search used to expand wildcard includes.

use globset::{GlobBuilder, GlobMatcher};
use std::collections::{BTreeSet, HashMap};

use crate::{Error, ProjectPath, Result, Revision};

/// Lists files of a project's repository at a revision.
pub trait RepositorySearch: Send + Sync {
    /// Return every path at `revision` matching `pattern`, in a stable order.
    ///
    /// `*` matches within one path segment, `**` spans segments.
    fn search_files_by_wildcard_path(
        &self,
        project: &ProjectPath,
        pattern: &str,
        revision: &Revision,
    ) -> Result<Vec<String>>;
}

/// Compile a wildcard include pattern into a matcher.
pub fn wildcard_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::InvalidInput(format!("invalid wildcard path '{}': {}", pattern, e)))?;
    Ok(glob.compile_matcher())
}

/// Repository contents held in memory, keyed by project and revision.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    trees: HashMap<(ProjectPath, Revision), BTreeSet<String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the tree of `project` at `revision`.
    pub fn add_file(
        &mut self,
        project: impl Into<ProjectPath>,
        revision: impl Into<Revision>,
        path: impl Into<String>,
    ) {
        self.trees
            .entry((project.into(), revision.into()))
            .or_default()
            .insert(path.into());
    }

    pub fn with_file(
        mut self,
        project: impl Into<ProjectPath>,
        revision: impl Into<Revision>,
        path: impl Into<String>,
    ) -> Self {
        self.add_file(project, revision, path);
        self
    }
}

impl RepositorySearch for InMemoryRepository {
    fn search_files_by_wildcard_path(
        &self,
        project: &ProjectPath,
        pattern: &str,
        revision: &Revision,
    ) -> Result<Vec<String>> {
        // A tree that was never registered has no files to match.
        let Some(tree) = self.trees.get(&(project.clone(), revision.clone())) else {
            return Ok(Vec::new());
        };

        let matcher = wildcard_matcher(pattern)?;
        Ok(tree
            .iter()
            .filter(|path| matcher.is_match(path.as_str()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> InMemoryRepository {
        InMemoryRepository::new()
            .with_file("group/app", "sha1", "templates/b.yml")
            .with_file("group/app", "sha1", "templates/a.yml")
            .with_file("group/app", "sha1", "templates/nested/c.yml")
            .with_file("group/app", "sha1", "README.md")
            .with_file("group/app", "sha2", "templates/only-in-sha2.yml")
    }

    #[test]
    fn test_star_stays_within_segment() {
        let found = repo()
            .search_files_by_wildcard_path(&"group/app".into(), "templates/*.yml", &"sha1".into())
            .unwrap();
        assert_eq!(found, vec!["templates/a.yml", "templates/b.yml"]);
    }

    #[test]
    fn test_double_star_spans_segments() {
        let found = repo()
            .search_files_by_wildcard_path(
                &"group/app".into(),
                "templates/**/*.yml",
                &"sha1".into(),
            )
            .unwrap();
        assert_eq!(
            found,
            vec!["templates/a.yml", "templates/b.yml", "templates/nested/c.yml"]
        );
    }

    #[test]
    fn test_search_is_scoped_to_revision() {
        let found = repo()
            .search_files_by_wildcard_path(&"group/app".into(), "templates/*.yml", &"sha2".into())
            .unwrap();
        assert_eq!(found, vec!["templates/only-in-sha2.yml"]);
    }

    #[test]
    fn test_unknown_revision_matches_nothing() {
        let found = repo()
            .search_files_by_wildcard_path(&"group/app".into(), "*.yml", &"missing".into())
            .unwrap();
        assert!(found.is_empty());

        let found = InMemoryRepository::new()
            .search_files_by_wildcard_path(&"group/app".into(), "templates/*.yml", &"sha1".into())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(matches!(
            wildcard_matcher("templates/[*.yml"),
            Err(Error::InvalidInput(_))
        ));
    }
}
