//! Reading `include` directives from pipeline documents.
//!
//! KDL form:
//!
//! ```kdl
//! include "templates/*.yml"
//! include "https://example.com/ci.yml"
//! include project="group/other" ref="main" {
//!     file "x.yml" "y.yml"
//! }
//! include artifact="generated.yml" job="generate"
//! include local="deploy.yml" {
//!     rules {
//!         rule if="$CI_COMMIT_BRANCH == 'main'"
//!         rule when="never"
//!     }
//! }
//! ```

use kdl::{KdlDocument, KdlNode};
use serde_json::Value;
use weave_core::{Rule, RuleWhen};

use crate::include::{FileSpec, Location, RawInclude};
use crate::{ConfigError, ConfigResult};

/// Collect the `include` directives of a KDL pipeline document.
pub fn parse_includes(kdl: &str) -> ConfigResult<Vec<RawInclude>> {
    let doc: KdlDocument = kdl.parse()?;

    doc.nodes()
        .iter()
        .filter(|node| node.name().value() == "include")
        .map(parse_include)
        .collect()
}

/// Collect the `include` key of a JSON pipeline document.
///
/// The key may hold a single entry or a list; `null` entries are skipped.
pub fn includes_from_json(document: &Value) -> ConfigResult<Vec<RawInclude>> {
    match document.get("include") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| serde_json::from_value(item.clone()).map_err(ConfigError::from))
            .collect(),
        Some(item) => Ok(vec![serde_json::from_value(item.clone())?]),
    }
}

fn parse_include(node: &KdlNode) -> ConfigResult<RawInclude> {
    let positional: Vec<_> = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .collect();

    if !positional.is_empty() {
        let has_props = node.entries().iter().any(|e| e.name().is_some());
        if positional.len() > 1 || has_props || node.children().is_some() {
            return Err(invalid(
                "include",
                "a path include takes exactly one argument and nothing else",
            ));
        }
        let path = positional[0]
            .value()
            .as_string()
            .ok_or_else(|| invalid("include", "path must be a string"))?;
        return Ok(RawInclude::Path(path.to_string()));
    }

    let mut location = Location::default();

    for entry in node.entries() {
        let key = entry.name().map(|n| n.value()).unwrap_or_default();
        let value = entry
            .value()
            .as_string()
            .ok_or_else(|| invalid(&format!("include {}", key), "expected a string"))?
            .to_string();

        match key {
            "local" => location.local = Some(value),
            "remote" => location.remote = Some(value),
            "template" => location.template = Some(value),
            "project" => location.project = Some(value),
            "artifact" => location.artifact = Some(value),
            "job" => location.job = Some(value),
            "ref" => location.ref_name = Some(value),
            "file" => {
                location.file = Some(match location.file.take() {
                    None => FileSpec::One(value),
                    Some(FileSpec::One(first)) => FileSpec::Many(vec![first, value]),
                    Some(FileSpec::Many(mut files)) => {
                        files.push(value);
                        FileSpec::Many(files)
                    }
                });
            }
            other => {
                return Err(invalid(
                    "include",
                    &format!("unknown property '{}'", other),
                ));
            }
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "file" => {
                    location.file = Some(FileSpec::Many(get_all_string_args(child)));
                }
                "rules" => {
                    location.rules = Some(parse_rules(child)?);
                }
                other => {
                    return Err(invalid(
                        "include",
                        &format!("unknown child node '{}'", other),
                    ));
                }
            }
        }
    }

    Ok(RawInclude::Record(location))
}

fn parse_rules(node: &KdlNode) -> ConfigResult<Vec<Rule>> {
    let Some(children) = node.children() else {
        return Ok(Vec::new());
    };

    children
        .nodes()
        .iter()
        .map(|child| match child.name().value() {
            "rule" => parse_rule(child),
            other => Err(invalid("rules", &format!("unknown node '{}'", other))),
        })
        .collect()
}

fn parse_rule(node: &KdlNode) -> ConfigResult<Rule> {
    let mut rule = Rule::new();

    for entry in node.entries() {
        let Some(key) = entry.name().map(|n| n.value()) else {
            return Err(invalid("rule", "rules take properties, not arguments"));
        };
        let value = entry
            .value()
            .as_string()
            .ok_or_else(|| invalid(&format!("rule {}", key), "expected a string"))?;

        match key {
            "if" => rule.if_expr = Some(value.to_string()),
            "exists" => rule.exists.push(value.to_string()),
            "when" => {
                let when: RuleWhen = value
                    .parse()
                    .map_err(|message: String| invalid("rule when", &message))?;
                rule.when = Some(when);
            }
            other => {
                return Err(invalid("rule", &format!("unknown property '{}'", other)));
            }
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "exists" {
                rule.exists.extend(get_all_string_args(child));
            }
        }
    }

    Ok(rule)
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}
