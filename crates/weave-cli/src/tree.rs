//! Working-tree collaborators for local resolution.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use weave_config::include::{FetchedFile, FileFetcher};
use weave_config::FileAccessor;
use weave_core::repository::wildcard_matcher;
use weave_core::{Error, ProjectPath, RepositorySearch, Result, Revision};

/// A checked-out repository on disk.
///
/// Searches ignore the requested project and revision: the tree is whatever
/// is checked out under `root`.
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a repository-relative include path under the root.
    fn file_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(Error::InvalidInput(format!(
                "include path escapes the repository: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl RepositorySearch for WorkingTree {
    fn search_files_by_wildcard_path(
        &self,
        _project: &ProjectPath,
        pattern: &str,
        _revision: &Revision,
    ) -> Result<Vec<String>> {
        let matcher = wildcard_matcher(pattern.trim_start_matches('/'))?;
        let mut found = Vec::new();

        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| Error::Repository(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if matcher.is_match(&relative) {
                found.push(relative);
            }
        }

        found.sort();
        Ok(found)
    }
}

impl FileFetcher for WorkingTree {
    fn fetch(&self, file: &FileAccessor) -> Result<FetchedFile> {
        match file {
            FileAccessor::Local { path, .. } => {
                let full = self.file_path(path)?;
                let content = std::fs::read_to_string(&full)
                    .map_err(|e| Error::NotFound(format!("{}: {}", full.display(), e)))?;
                Ok(FetchedFile::new(content, file.default_nested_scope()))
            }
            other => Err(Error::Unsupported(format!(
                "{} cannot be fetched from a working tree",
                other
            ))),
        }
    }
}
