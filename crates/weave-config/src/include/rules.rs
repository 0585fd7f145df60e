//! Include rule evaluation.
//!
//! The resolver only needs a pass/fail verdict; [`ExpressionRuleEvaluator`]
//! is the evaluator used when a context is not given another one.

use regex::Regex;
use std::sync::LazyLock;
use weave_core::{Error, Result, Rule, RuleOutcome, RuleWhen};

use super::Context;
use crate::Variables;

/// Decides whether a rules-guarded include is active.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, rules: &[Rule], ctx: &Context) -> Result<RuleOutcome>;
}

static COMPARISON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([a-zA-Z_][a-zA-Z0-9_]*)\s*(==|!=)\s*(.+)$").unwrap()
});

static PRESENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([a-zA-Z_][a-zA-Z0-9_]*)$").unwrap());

/// Evaluates `if:` variable expressions and `exists:` path checks.
///
/// The first rule whose clauses all hold decides: `when: never` fails the
/// include, anything else passes it. When no rule holds the include fails.
#[derive(Debug, Clone, Default)]
pub struct ExpressionRuleEvaluator;

impl ExpressionRuleEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn rule_matches(&self, rule: &Rule, ctx: &Context) -> Result<bool> {
        if let Some(expr) = &rule.if_expr {
            if !evaluate_expression(expr, ctx.variables())? {
                return Ok(false);
            }
        }

        if !rule.exists.is_empty() && !self.any_exists(&rule.exists, ctx)? {
            return Ok(false);
        }

        Ok(true)
    }

    fn any_exists(&self, patterns: &[String], ctx: &Context) -> Result<bool> {
        let (project, revision) = (ctx.project(), ctx.revision());
        for pattern in patterns {
            let pattern = ctx.variables().expand(pattern);
            let found = ctx
                .repository()
                .search_files_by_wildcard_path(project, &pattern, revision)?;
            if !found.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl RuleEvaluator for ExpressionRuleEvaluator {
    fn evaluate(&self, rules: &[Rule], ctx: &Context) -> Result<RuleOutcome> {
        for rule in rules {
            if self.rule_matches(rule, ctx)? {
                return Ok(match rule.when {
                    Some(RuleWhen::Never) => RuleOutcome::Fail,
                    Some(RuleWhen::Always) | None => RuleOutcome::Pass,
                });
            }
        }
        Ok(RuleOutcome::Fail)
    }
}

/// Evaluate an `if:` expression. `&&` binds tighter than `||`.
pub fn evaluate_expression(expr: &str, variables: &Variables) -> Result<bool> {
    if expr.trim().is_empty() {
        return Err(Error::RuleValidation("empty `if` expression".to_string()));
    }

    for alternative in split_outside_quotes(expr, "||") {
        let mut all = true;
        for clause in split_outside_quotes(alternative, "&&") {
            if !evaluate_clause(clause.trim(), variables)? {
                all = false;
                break;
            }
        }
        if all {
            return Ok(true);
        }
    }
    Ok(false)
}

fn evaluate_clause(clause: &str, variables: &Variables) -> Result<bool> {
    if let Some(caps) = PRESENCE_REGEX.captures(clause) {
        return Ok(variables.get(&caps[1]).is_some_and(|v| !v.is_empty()));
    }

    let caps = COMPARISON_REGEX
        .captures(clause)
        .ok_or_else(|| Error::RuleValidation(format!("unsupported expression: {}", clause)))?;

    let left = variables.get(&caps[1]);
    let right = operand(caps[3].trim(), variables)?;
    let equal = left == right.as_deref();

    Ok(match &caps[2] {
        "==" => equal,
        _ => !equal,
    })
}

fn operand(raw: &str, variables: &Variables) -> Result<Option<String>> {
    if raw == "null" {
        return Ok(None);
    }
    if let Some(caps) = PRESENCE_REGEX.captures(raw) {
        return Ok(variables.get(&caps[1]).map(str::to_string));
    }
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Ok(Some(raw[1..raw.len() - 1].to_string()));
        }
    }
    Err(Error::RuleValidation(format!(
        "expected a quoted string, variable or null, got: {}",
        raw
    )))
}

fn split_outside_quotes<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if input[idx..].starts_with(separator) && idx >= start => {
                parts.push(&input[start..idx]);
                start = idx + separator.len();
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::InMemoryRepository;

    fn vars() -> Variables {
        Variables::new()
            .with("CI_COMMIT_BRANCH", "main")
            .with("DEPLOY", "true")
            .with("EMPTY", "")
    }

    #[test]
    fn test_presence() {
        assert!(evaluate_expression("$DEPLOY", &vars()).unwrap());
        assert!(!evaluate_expression("$EMPTY", &vars()).unwrap());
        assert!(!evaluate_expression("$MISSING", &vars()).unwrap());
    }

    #[test]
    fn test_comparisons() {
        assert!(evaluate_expression(r#"$CI_COMMIT_BRANCH == "main""#, &vars()).unwrap());
        assert!(evaluate_expression("$CI_COMMIT_BRANCH != 'dev'", &vars()).unwrap());
        assert!(evaluate_expression("$MISSING == null", &vars()).unwrap());
        assert!(!evaluate_expression("$MISSING == 'main'", &vars()).unwrap());
        assert!(evaluate_expression("$CI_COMMIT_BRANCH == $CI_COMMIT_BRANCH", &vars()).unwrap());
    }

    #[test]
    fn test_boolean_operators() {
        assert!(evaluate_expression("$MISSING || $DEPLOY", &vars()).unwrap());
        assert!(!evaluate_expression("$MISSING && $DEPLOY", &vars()).unwrap());
        assert!(
            evaluate_expression("$MISSING && $DEPLOY || $CI_COMMIT_BRANCH == 'main'", &vars())
                .unwrap()
        );
    }

    #[test]
    fn test_operators_inside_quotes_are_literal() {
        let vars = Variables::new().with("MSG", "a || b");
        assert!(evaluate_expression("$MSG == 'a || b'", &vars).unwrap());
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(matches!(
            evaluate_expression("", &vars()),
            Err(Error::RuleValidation(_))
        ));
        assert!(matches!(
            evaluate_expression("$A =~ /main/", &vars()),
            Err(Error::RuleValidation(_))
        ));
        assert!(matches!(
            evaluate_expression("$A == main", &vars()),
            Err(Error::RuleValidation(_))
        ));
    }

    fn ctx() -> Context {
        Context::builder("group/app", "sha")
            .with_variables(vars())
            .with_repository(InMemoryRepository::new().with_file("group/app", "sha", "Dockerfile"))
            .build()
    }

    #[test]
    fn test_first_matching_rule_decides() {
        let evaluator = ExpressionRuleEvaluator::new();
        let rules = vec![
            Rule::new().with_if("$DEPLOY").with_when(RuleWhen::Never),
            Rule::new().with_if("$CI_COMMIT_BRANCH == 'main'"),
        ];
        assert_eq!(evaluator.evaluate(&rules, &ctx()).unwrap(), RuleOutcome::Fail);

        let rules = vec![
            Rule::new().with_if("$MISSING").with_when(RuleWhen::Never),
            Rule::new().with_if("$CI_COMMIT_BRANCH == 'main'"),
        ];
        assert_eq!(evaluator.evaluate(&rules, &ctx()).unwrap(), RuleOutcome::Pass);
    }

    #[test]
    fn test_no_matching_rule_fails() {
        let evaluator = ExpressionRuleEvaluator::new();
        let rules = vec![Rule::new().with_if("$MISSING")];
        assert_eq!(evaluator.evaluate(&rules, &ctx()).unwrap(), RuleOutcome::Fail);
        assert_eq!(evaluator.evaluate(&[], &ctx()).unwrap(), RuleOutcome::Fail);
    }

    #[test]
    fn test_exists_clause() {
        let evaluator = ExpressionRuleEvaluator::new();
        let present = vec![Rule::new().with_exists("Dockerfile")];
        let absent = vec![Rule::new().with_exists("*.tf")];
        assert_eq!(evaluator.evaluate(&present, &ctx()).unwrap(), RuleOutcome::Pass);
        assert_eq!(evaluator.evaluate(&absent, &ctx()).unwrap(), RuleOutcome::Fail);
    }

    #[test]
    fn test_exists_searches_the_current_scope() {
        let evaluator = ExpressionRuleEvaluator::new();
        let other = ctx().nested(crate::Scope::new("group/lib", "sha"));
        let rules = vec![Rule::new().with_exists("Dockerfile")];
        assert_eq!(
            evaluator.evaluate(&rules, &other).unwrap(),
            RuleOutcome::Fail
        );
    }
}
