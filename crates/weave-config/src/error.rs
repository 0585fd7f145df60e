//! Configuration and include-resolution errors.

use thiserror::Error;

use crate::include::Location;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("include `{}` needs to match exactly one accessor", .location.to_json())]
    AmbiguousSpecification { location: Box<Location> },

    #[error("include `{}` was already included", .location.to_json())]
    DuplicateIncludes { location: Box<Location> },

    #[error("maximum of {max} nested includes are allowed")]
    TooManyIncludes { max: usize },

    #[error("failed to fetch {file}: {source}")]
    Fetch {
        file: String,
        #[source]
        source: weave_core::Error,
    },

    #[error(transparent)]
    Collaborator(#[from] weave_core::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
