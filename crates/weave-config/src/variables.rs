//! Variable interpolation for include directives.
//!
//! Supports the placeholder forms pipeline authors already use:
//! - `$NAME`
//! - `${NAME}`
//! - `%NAME%`
//!
//! Unknown variables expand to an empty string.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

// One alternative per placeholder form; exactly one capture group participates.
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$([a-zA-Z_][a-zA-Z0-9_]*)|\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}|%([a-zA-Z_][a-zA-Z0-9_]*)%",
    )
    .unwrap()
});

/// Ordered variable bindings available to a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: IndexMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Interpolate all variables in a string.
    pub fn expand(&self, input: &str) -> String {
        VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                self.get(name).unwrap_or_default().to_string()
            })
            .into_owned()
    }

    /// Interpolate variables in a list of strings.
    pub fn expand_vec(&self, inputs: &[String]) -> Vec<String> {
        inputs.iter().map(|s| self.expand(s)).collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Variables
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        for (name, value) in iter {
            variables.set(name, value);
        }
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_interpolation() {
        let vars = Variables::new()
            .with("CI_COMMIT_SHA", "abc1234567890")
            .with("CI_COMMIT_BRANCH", "main");

        let result = vars.expand("Commit $CI_COMMIT_SHA on ${CI_COMMIT_BRANCH}");
        assert_eq!(result, "Commit abc1234567890 on main");
    }

    #[test]
    fn test_percent_form() {
        let vars = Variables::new().with("DIR", "templates");
        assert_eq!(vars.expand("%DIR%/build.yml"), "templates/build.yml");
    }

    #[test]
    fn test_unknown_variable_is_empty() {
        let vars = Variables::new();
        assert_eq!(vars.expand("ci/$UNKNOWN/build.yml"), "ci//build.yml");
        assert_eq!(vars.expand("${UNKNOWN}.yml"), ".yml");
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let vars = Variables::new().with("A", "x");
        assert_eq!(vars.expand("templates/*.yml"), "templates/*.yml");
        assert_eq!(vars.expand("100% sure"), "100% sure");
    }

    #[test]
    fn test_nested_braces() {
        let vars = Variables::new().with("SHA", "abc123");
        let result = vars.expand(r#"{"sha": "${SHA}"}"#);
        assert_eq!(result, r#"{"sha": "abc123"}"#);
    }

    #[test]
    fn test_expand_vec() {
        let vars = Variables::new().with("ENV", "staging");
        let inputs = vec!["deploy-$ENV.yml".to_string(), "test.yml".to_string()];
        assert_eq!(vars.expand_vec(&inputs), vec!["deploy-staging.yml", "test.yml"]);
    }

    #[test]
    fn test_set_preserves_order_and_replaces() {
        let mut vars: Variables = [("B", "1"), ("A", "2")].into_iter().collect();
        vars.set("B", "3");
        let names: Vec<_> = vars.iter().collect();
        assert_eq!(names, vec![("B", "3"), ("A", "2")]);
    }
}
