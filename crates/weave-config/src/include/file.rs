//! Resolved include files and the classifier that produces them.

use serde::Serialize;
use std::fmt;
use url::Url;
use weave_core::{ProjectPath, Revision};

use super::location::is_valid_url;
use super::{Context, Location, Scope};
use crate::{ConfigError, ConfigResult};

/// Where a resolved file came from, kept for error attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub location: Location,
    pub scope: Scope,
}

/// A fully resolved include, ready to hand to a fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileAccessor {
    Remote {
        url: Url,
        origin: Origin,
    },
    Template {
        name: String,
        origin: Origin,
    },
    Local {
        path: String,
        origin: Origin,
    },
    Project {
        project: ProjectPath,
        file: String,
        #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
        ref_name: Option<String>,
        origin: Origin,
    },
    Artifact {
        job: String,
        path: String,
        origin: Origin,
    },
}

/// The five kinds of include source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Remote,
    Template,
    Local,
    Project,
    Artifact,
}

impl FileKind {
    pub const ALL: [FileKind; 5] = [
        FileKind::Remote,
        FileKind::Template,
        FileKind::Local,
        FileKind::Project,
        FileKind::Artifact,
    ];

    /// Build the accessor of this kind if `location` matches it.
    pub fn accessor(self, location: &Location, scope: &Scope) -> Option<FileAccessor> {
        let origin = || Origin {
            location: location.clone(),
            scope: scope.clone(),
        };

        match self {
            FileKind::Remote => {
                let url = present(&location.remote).filter(|url| is_valid_url(url))?;
                let url = Url::parse(url).ok()?;
                Some(FileAccessor::Remote {
                    url,
                    origin: origin(),
                })
            }
            FileKind::Template => present(&location.template).map(|name| FileAccessor::Template {
                name: name.to_string(),
                origin: origin(),
            }),
            FileKind::Local => present(&location.local).map(|path| FileAccessor::Local {
                path: path.to_string(),
                origin: origin(),
            }),
            FileKind::Project => {
                let project = present(&location.project)?;
                let file = location
                    .file
                    .as_ref()
                    .and_then(|file| file.as_single())
                    .filter(|file| !file.trim().is_empty())?;
                Some(FileAccessor::Project {
                    project: ProjectPath::new(project),
                    file: file.to_string(),
                    ref_name: location.ref_name.clone(),
                    origin: origin(),
                })
            }
            FileKind::Artifact => {
                let path = present(&location.artifact)?;
                let job = present(&location.job)?;
                Some(FileAccessor::Artifact {
                    job: job.to_string(),
                    path: path.to_string(),
                    origin: origin(),
                })
            }
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Remote => write!(f, "remote"),
            FileKind::Template => write!(f, "template"),
            FileKind::Local => write!(f, "local"),
            FileKind::Project => write!(f, "project"),
            FileKind::Artifact => write!(f, "artifact"),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl FileAccessor {
    pub fn kind(&self) -> FileKind {
        match self {
            FileAccessor::Remote { .. } => FileKind::Remote,
            FileAccessor::Template { .. } => FileKind::Template,
            FileAccessor::Local { .. } => FileKind::Local,
            FileAccessor::Project { .. } => FileKind::Project,
            FileAccessor::Artifact { .. } => FileKind::Artifact,
        }
    }

    pub fn origin(&self) -> &Origin {
        match self {
            FileAccessor::Remote { origin, .. }
            | FileAccessor::Template { origin, .. }
            | FileAccessor::Local { origin, .. }
            | FileAccessor::Project { origin, .. }
            | FileAccessor::Artifact { origin, .. } => origin,
        }
    }

    pub fn location(&self) -> &Location {
        &self.origin().location
    }

    /// Scope for includes found inside this file, before a fetcher pins a
    /// project ref to a commit.
    ///
    /// Project files move to the target project at the requested ref (`HEAD`
    /// when none). Every other kind has no repository of its own and stays
    /// in the including scope.
    pub fn default_nested_scope(&self) -> Scope {
        match self {
            FileAccessor::Project {
                project, ref_name, ..
            } => Scope::new(
                project.clone(),
                Revision::new(ref_name.as_deref().unwrap_or("HEAD")),
            ),
            FileAccessor::Remote { origin, .. }
            | FileAccessor::Template { origin, .. }
            | FileAccessor::Local { origin, .. }
            | FileAccessor::Artifact { origin, .. } => origin.scope.clone(),
        }
    }
}

impl fmt::Display for FileAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAccessor::Remote { url, .. } => write!(f, "remote `{}`", url),
            FileAccessor::Template { name, .. } => write!(f, "template `{}`", name),
            FileAccessor::Local { path, origin } => write!(f, "local `{}` ({})", path, origin.scope),
            FileAccessor::Project {
                project,
                file,
                ref_name,
                ..
            } => match ref_name {
                Some(ref_name) => write!(f, "project `{}/{}` at `{}`", project, file, ref_name),
                None => write!(f, "project `{}/{}`", project, file),
            },
            FileAccessor::Artifact { job, path, .. } => {
                write!(f, "artifact `{}` of job `{}`", path, job)
            }
        }
    }
}

/// Classify `location` as exactly one kind of file.
pub fn select_first_matching(location: Location, ctx: &Context) -> ConfigResult<FileAccessor> {
    let mut matching = FileKind::ALL
        .iter()
        .filter_map(|kind| kind.accessor(&location, ctx.scope()));

    match (matching.next(), matching.next()) {
        (Some(file), None) => Ok(file),
        _ => Err(ConfigError::AmbiguousSpecification {
            location: Box::new(location),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::builder("group/app", "sha").build()
    }

    #[test]
    fn test_classifies_each_kind() {
        let cases = [
            (Location::remote("https://example.com/ci.yml"), FileKind::Remote),
            (Location::template("Auto-DevOps.gitlab-ci.yml"), FileKind::Template),
            (Location::local("ci/a.yml"), FileKind::Local),
            (
                Location {
                    project: Some("group/other".into()),
                    ..Location::default()
                }
                .with_file("x.yml"),
                FileKind::Project,
            ),
            (Location::artifact("generated.yml", "generate"), FileKind::Artifact),
        ];

        for (location, kind) in cases {
            let file = select_first_matching(location, &ctx()).unwrap();
            assert_eq!(file.kind(), kind);
        }
    }

    #[test]
    fn test_local_and_remote_is_ambiguous() {
        let location = Location {
            local: Some("ci/a.yml".into()),
            remote: Some("https://example.com/ci.yml".into()),
            ..Location::default()
        };
        let result = select_first_matching(location, &ctx());
        assert!(matches!(
            result,
            Err(ConfigError::AmbiguousSpecification { .. })
        ));
    }

    #[test]
    fn test_no_driving_key_is_ambiguous() {
        let location = Location::default().with_file("x.yml").with_ref("main");
        let err = select_first_matching(location, &ctx()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"include `{"file":"x.yml","ref":"main"}` needs to match exactly one accessor"#
        );
    }

    #[test]
    fn test_invalid_remote_url_matches_nothing() {
        let result = select_first_matching(Location::remote("not a url"), &ctx());
        assert!(matches!(
            result,
            Err(ConfigError::AmbiguousSpecification { .. })
        ));
    }

    #[test]
    fn test_project_requires_single_file() {
        let without_file = Location {
            project: Some("group/other".into()),
            ..Location::default()
        };
        assert!(select_first_matching(without_file, &ctx()).is_err());

        let with_list = Location::project("group/other", ["x.yml", "y.yml"]);
        assert!(select_first_matching(with_list, &ctx()).is_err());
    }

    #[test]
    fn test_artifact_requires_job() {
        let location = Location {
            artifact: Some("generated.yml".into()),
            ..Location::default()
        };
        assert!(select_first_matching(location, &ctx()).is_err());
    }

    #[test]
    fn test_accessor_carries_origin() {
        let file = select_first_matching(Location::local("ci/a.yml"), &ctx()).unwrap();
        assert_eq!(file.location(), &Location::local("ci/a.yml"));
        assert_eq!(file.origin().scope, Scope::new("group/app", "sha"));
    }

    #[test]
    fn test_default_nested_scope() {
        let local = select_first_matching(Location::local("ci/a.yml"), &ctx()).unwrap();
        assert_eq!(local.default_nested_scope(), Scope::new("group/app", "sha"));

        let project = select_first_matching(
            Location {
                project: Some("group/other".into()),
                ..Location::default()
            }
            .with_file("x.yml")
            .with_ref("v2"),
            &ctx(),
        )
        .unwrap();
        assert_eq!(project.default_nested_scope(), Scope::new("group/other", "v2"));

        let remote =
            select_first_matching(Location::remote("https://example.com/ci.yml"), &ctx()).unwrap();
        assert_eq!(remote.default_nested_scope(), *ctx().scope());
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let file =
            select_first_matching(Location::remote("https://example.com/ci.yml"), &ctx()).unwrap();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "remote");
        assert_eq!(json["url"], "https://example.com/ci.yml");
    }
}
