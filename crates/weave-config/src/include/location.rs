//! Canonical include locations.

use serde::{Deserialize, Serialize};
use url::Url;
use weave_core::Rule;

/// One include directive in canonical record form.
///
/// Which of `local`, `remote`, `template`, `project` and `artifact` is set
/// decides the kind of file the include resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Job that produced `artifact`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSpec>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
}

/// The `file` key of a project include: one path or several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileSpec {
    One(String),
    Many(Vec<String>),
}

impl FileSpec {
    /// The paths as a list, wrapping a single path.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            FileSpec::One(path) => vec![path.as_str()],
            FileSpec::Many(paths) => paths.iter().map(|p| p.as_str()).collect(),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            FileSpec::One(path) => Some(path),
            FileSpec::Many(_) => None,
        }
    }
}

impl Location {
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            local: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            remote: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn template(name: impl Into<String>) -> Self {
        Self {
            template: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn project<I, S>(project: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            project: Some(project.into()),
            file: Some(FileSpec::Many(files.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    pub fn artifact(path: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            artifact: Some(path.into()),
            job: Some(job.into()),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(FileSpec::One(file.into()));
        self
    }

    pub fn with_ref(mut self, ref_name: impl Into<String>) -> Self {
        self.ref_name = Some(ref_name.into());
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// True for a local path containing a `*` glob.
    pub fn is_wildcard(&self) -> bool {
        self.local.as_deref().is_some_and(|path| path.contains('*'))
    }

    /// Compact JSON rendering used in error messages.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// An include entry as written by the pipeline author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInclude {
    /// Bare string: a URL or a local path.
    Path(String),
    Record(Location),
}

impl From<&str> for RawInclude {
    fn from(path: &str) -> Self {
        RawInclude::Path(path.to_string())
    }
}

impl From<String> for RawInclude {
    fn from(path: String) -> Self {
        RawInclude::Path(path)
    }
}

impl From<Location> for RawInclude {
    fn from(location: Location) -> Self {
        RawInclude::Record(location)
    }
}

/// Whether `value` is an absolute http(s) URL with a host.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
