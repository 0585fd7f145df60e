//! Project and revision identities.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Full path of a project, e.g. `group/subgroup/service`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct ProjectPath(String);

impl ProjectPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

impl From<&str> for ProjectPath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

/// A repository revision, normally a commit SHA.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    /// First seven characters, the way commits are abbreviated in logs.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<&str> for Revision {
    fn from(sha: &str) -> Self {
        Self(sha.to_string())
    }
}
