//! Shared bookkeeping for one include expansion tree.
//!
//! Every nested resolution triggered while composing a single pipeline
//! configuration inserts into the same set. Insertion is the only cycle and
//! duplicate guard, and the set size is the global bound on work.

use indexmap::IndexSet;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use weave_core::{ExpansionId, ProjectPath, Revision};

use super::Location;
use crate::{ConfigError, ConfigResult};

/// Upper bound on scoped locations across one expansion tree.
pub const MAX_INCLUDES: usize = 100;

/// A location together with the project and revision it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScopedLocation {
    pub location: Location,
    pub project: ProjectPath,
    pub revision: Revision,
}

#[derive(Debug)]
pub struct ExpandSet {
    id: ExpansionId,
    limit: usize,
    entries: Mutex<IndexSet<ScopedLocation>>,
}

impl ExpandSet {
    pub fn new() -> Self {
        Self::with_limit(MAX_INCLUDES)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            id: ExpansionId::new(),
            limit,
            entries: Mutex::new(IndexSet::new()),
        }
    }

    /// Identifier shared by every log line of this expansion tree.
    pub fn id(&self) -> ExpansionId {
        self.id
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, scoped: &ScopedLocation) -> bool {
        self.lock().contains(scoped)
    }

    /// Snapshot of the inserted locations, oldest first.
    pub fn entries(&self) -> Vec<ScopedLocation> {
        self.lock().iter().cloned().collect()
    }

    /// Record `scoped`, failing if the set is full or already holds it.
    ///
    /// The size check and the insert happen under one lock.
    pub fn insert(&self, scoped: ScopedLocation) -> ConfigResult<()> {
        let mut entries = self.lock();

        if entries.len() >= self.limit {
            return Err(ConfigError::TooManyIncludes { max: self.limit });
        }

        if entries.contains(&scoped) {
            return Err(ConfigError::DuplicateIncludes {
                location: Box::new(scoped.location),
            });
        }

        entries.insert(scoped);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, IndexSet<ScopedLocation>> {
        // Entries are only ever appended, so a poisoned set is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ExpandSet {
    fn default() -> Self {
        Self::new()
    }
}
