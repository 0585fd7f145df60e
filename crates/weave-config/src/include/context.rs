//! Resolution context.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use weave_core::{InMemoryRepository, ProjectPath, RepositorySearch, Revision};

use super::ExpandSet;
use super::rules::{ExpressionRuleEvaluator, RuleEvaluator};
use crate::{Instrumentation, Variables};

/// The project and revision a set of includes is resolved under.
///
/// Remote files and templates have no repository of their own and are
/// resolved under the scope of the file that included them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    pub project: ProjectPath,
    pub revision: Revision,
}

impl Scope {
    pub fn new(project: impl Into<ProjectPath>, revision: impl Into<Revision>) -> Self {
        Self {
            project: project.into(),
            revision: revision.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.revision.short())
    }
}

/// Everything one call to [`resolve`](super::resolve) needs.
///
/// Cloning is cheap; clones and [`Context::nested`] contexts share the same
/// [`ExpandSet`].
#[derive(Clone)]
pub struct Context {
    scope: Scope,
    variables: Arc<Variables>,
    expand_set: Arc<ExpandSet>,
    repository: Arc<dyn RepositorySearch>,
    rule_evaluator: Arc<dyn RuleEvaluator>,
    instrumentation: Option<Arc<Instrumentation>>,
}

impl Context {
    pub fn builder(
        project: impl Into<ProjectPath>,
        revision: impl Into<Revision>,
    ) -> ContextBuilder {
        ContextBuilder::new(Scope::new(project, revision))
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn project(&self) -> &ProjectPath {
        &self.scope.project
    }

    pub fn revision(&self) -> &Revision {
        &self.scope.revision
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn expand_set(&self) -> &Arc<ExpandSet> {
        &self.expand_set
    }

    pub fn repository(&self) -> &dyn RepositorySearch {
        self.repository.as_ref()
    }

    pub fn rule_evaluator(&self) -> &dyn RuleEvaluator {
        self.rule_evaluator.as_ref()
    }

    pub fn instrumentation(&self) -> Option<&Arc<Instrumentation>> {
        self.instrumentation.as_ref()
    }

    /// Context for includes found inside a file that came from `scope`.
    pub fn nested(&self, scope: Scope) -> Context {
        Context {
            scope,
            ..self.clone()
        }
    }

    /// Run `f` under the instrumentation, if any is attached.
    pub fn instrument<T>(&self, operation: &str, f: impl FnOnce() -> T) -> T {
        match &self.instrumentation {
            Some(instrumentation) => instrumentation.instrument(operation, f),
            None => f(),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.scope)
            .field("variables", &self.variables.len())
            .field("expand_set", &self.expand_set.id())
            .field("instrumented", &self.instrumentation.is_some())
            .finish()
    }
}

/// Builder for creating a top-level [`Context`].
pub struct ContextBuilder {
    scope: Scope,
    variables: Variables,
    expand_set: Option<Arc<ExpandSet>>,
    repository: Option<Arc<dyn RepositorySearch>>,
    rule_evaluator: Option<Arc<dyn RuleEvaluator>>,
    instrumentation: Option<Arc<Instrumentation>>,
}

impl ContextBuilder {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            variables: Variables::new(),
            expand_set: None,
            repository: None,
            rule_evaluator: None,
            instrumentation: None,
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.set(name, value);
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Share an existing expansion set instead of starting a fresh one.
    pub fn with_expand_set(mut self, expand_set: Arc<ExpandSet>) -> Self {
        self.expand_set = Some(expand_set);
        self
    }

    pub fn with_repository(mut self, repository: impl RepositorySearch + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    pub fn with_shared_repository(mut self, repository: Arc<dyn RepositorySearch>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_rule_evaluator(mut self, evaluator: impl RuleEvaluator + 'static) -> Self {
        self.rule_evaluator = Some(Arc::new(evaluator));
        self
    }

    pub fn with_instrumentation(mut self, instrumentation: Arc<Instrumentation>) -> Self {
        self.instrumentation = Some(instrumentation);
        self
    }

    pub fn build(self) -> Context {
        let repository: Arc<dyn RepositorySearch> = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryRepository::new()));
        let rule_evaluator: Arc<dyn RuleEvaluator> = self
            .rule_evaluator
            .unwrap_or_else(|| Arc::new(ExpressionRuleEvaluator::new()));

        Context {
            scope: self.scope,
            variables: Arc::new(self.variables),
            expand_set: self.expand_set.unwrap_or_default(),
            repository,
            rule_evaluator,
            instrumentation: self.instrumentation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_context_shares_expand_set() {
        let ctx = Context::builder("group/app", "sha1")
            .with_variable("ENV", "prod")
            .build();

        let nested = ctx.nested(Scope::new("group/lib", "sha2"));
        assert!(Arc::ptr_eq(ctx.expand_set(), nested.expand_set()));
        assert_eq!(nested.project(), &ProjectPath::new("group/lib"));
        assert_eq!(nested.variables().get("ENV"), Some("prod"));
    }

    #[test]
    fn test_independent_contexts_get_independent_sets() {
        let a = Context::builder("group/app", "sha1").build();
        let b = Context::builder("group/app", "sha1").build();
        assert!(!Arc::ptr_eq(a.expand_set(), b.expand_set()));
    }

    #[test]
    fn test_instrument_without_instrumentation_runs_closure() {
        let ctx = Context::builder("group/app", "sha1").build();
        assert_eq!(ctx.instrument("noop", || 7), 7);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(
            Scope::new("group/app", "abc1234567").to_string(),
            "group/app@abc1234"
        );
    }
}
