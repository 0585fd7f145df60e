//! Conditional include rules.
//!
//! Rules are opaque to the resolver: it only forwards them to a rule
//! evaluator and acts on the [`RuleOutcome`].

use serde::{Deserialize, Deserializer, Serialize};

/// One entry of an include's `rules:` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Variable expression, e.g. `$CI_COMMIT_BRANCH == "main"`.
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_expr: Option<String>,
    /// Paths (globs allowed) that must exist in the repository.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<RuleWhen>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_if(mut self, expr: impl Into<String>) -> Self {
        self.if_expr = Some(expr.into());
        self
    }

    pub fn with_exists(mut self, pattern: impl Into<String>) -> Self {
        self.exists.push(pattern.into());
        self
    }

    pub fn with_when(mut self, when: RuleWhen) -> Self {
        self.when = Some(when);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleWhen {
    Always,
    Never,
}

impl std::str::FromStr for RuleWhen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(RuleWhen::Always),
            "never" => Ok(RuleWhen::Never),
            _ => Err(format!("unknown rule `when` value: {}", s)),
        }
    }
}

/// Verdict of a rule evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail,
}

impl RuleOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, RuleOutcome::Pass)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_rule_with_single_exists() {
        let rule: Rule =
            serde_json::from_str(r#"{"if": "$CI", "exists": "Dockerfile", "when": "never"}"#)
                .unwrap();
        assert_eq!(rule.if_expr.as_deref(), Some("$CI"));
        assert_eq!(rule.exists, vec!["Dockerfile"]);
        assert_eq!(rule.when, Some(RuleWhen::Never));
    }

    #[test]
    fn test_deserialize_rule_with_exists_list() {
        let rule: Rule = serde_json::from_str(r#"{"exists": ["a.yml", "b/*.yml"]}"#).unwrap();
        assert_eq!(rule.exists, vec!["a.yml", "b/*.yml"]);
        assert_eq!(rule.if_expr, None);
    }

    #[test]
    fn test_unknown_when_is_rejected() {
        assert!(serde_json::from_str::<Rule>(r#"{"when": "manual"}"#).is_err());
        assert!("manual".parse::<RuleWhen>().is_err());
    }
}
