//! Rule trait and registry.

use super::model::{
    Entry, HostBlock, IncludeStatement, ModuleInvocation, PlaybookDocument, RoleRef, Scalar,
    ScalarContext, Task,
};
use super::rules;
use super::types::{
    Diagnostic, LintConfig, LintError, LintOpResult, Location, Position, RuleCategory, Severity,
};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// Kind of model node a rule can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    HostBlock,
    Task,
    Module,
    Role,
    Include,
    Entry,
    Scalar,
    /// Scalar in a `when`-style position.
    Conditional,
}

/// A borrowed model node handed to rules.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Document(&'a PlaybookDocument),
    HostBlock(&'a HostBlock),
    Task(&'a Task),
    Module(&'a ModuleInvocation),
    Role(&'a RoleRef),
    Include(&'a IncludeStatement),
    Entry(&'a Entry),
    Scalar(&'a Scalar),
}

impl<'a> Node<'a> {
    /// Dispatch kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::HostBlock(_) => NodeKind::HostBlock,
            Node::Task(_) => NodeKind::Task,
            Node::Module(_) => NodeKind::Module,
            Node::Role(_) => NodeKind::Role,
            Node::Include(_) => NodeKind::Include,
            Node::Entry(_) => NodeKind::Entry,
            Node::Scalar(s) if s.context == ScalarContext::Conditional => NodeKind::Conditional,
            Node::Scalar(_) => NodeKind::Scalar,
        }
    }

    /// Where the node starts in the source.
    pub fn position(&self) -> Position {
        match self {
            Node::Document(_) => Position::start(),
            Node::HostBlock(n) => n.position,
            Node::Task(n) => n.position,
            Node::Module(n) => n.position,
            Node::Role(n) => n.position,
            Node::Include(n) => n.position,
            Node::Entry(n) => n.position,
            Node::Scalar(n) => n.position,
        }
    }

    /// Last line covered by the node.
    pub fn end_line(&self) -> usize {
        match self {
            Node::Document(d) => d.source.len().max(1),
            Node::HostBlock(n) => n.end_line,
            Node::Task(n) => n.end_line,
            Node::Module(n) => n.end_line,
            Node::Role(n) => n.end_line,
            Node::Include(n) => n.end_line,
            Node::Entry(n) => n.end_line,
            Node::Scalar(n) => n.end_line,
        }
    }
}

/// Read-only state available to a rule while it evaluates one node.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub path: &'a Path,
    pub config: &'a LintConfig,
    pub document: &'a PlaybookDocument,
    /// Preceding sibling in the same list, if any.
    pub previous: Option<Node<'a>>,
}

impl<'a> RuleContext<'a> {
    /// Build a diagnostic for `rule` with its configured severity.
    pub fn report(
        &self,
        rule: &(impl Rule + ?Sized),
        position: Position,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic::new(
            rule.id(),
            self.config.severity_for(rule.id(), rule.default_severity()),
            rule.category(),
            message,
            Location::at(self.path, position),
        )
    }
}

/// A single style check.
///
/// Rules are stateless and pure: the same node and context always produce
/// the same diagnostics.
pub trait Rule: Send + Sync {
    /// Stable identifier, e.g. `quote-style`.
    fn id(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    fn category(&self) -> RuleCategory;

    fn default_severity(&self) -> Severity;

    /// Node kinds this rule is evaluated on.
    fn applies_to(&self) -> &'static [NodeKind];

    /// Evaluate the rule on one node.
    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic>;
}

/// Registry of rules, kept in registration order.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in rules.
    pub fn with_builtins() -> LintOpResult<Self> {
        let mut registry = Self::new();
        for rule in rules::builtin_rules() {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Register a rule. Identifiers must be unique.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> LintOpResult<()> {
        let id = rule.id();
        if self.rules.contains_key(id) {
            return Err(LintError::DuplicateRuleId(id.to_string()));
        }
        self.rules.insert(id.to_string(), rule);
        Ok(())
    }

    /// Get a rule by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// All rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.values()
    }

    /// Rules subscribed to a node kind, in registration order.
    pub fn rules_for(&self, kind: NodeKind) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules
            .values()
            .filter(move |rule| rule.applies_to().contains(&kind))
    }

    /// Rule identifiers in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyValueRule;

    impl Rule for EmptyValueRule {
        fn id(&self) -> &'static str {
            "empty-value"
        }

        fn description(&self) -> &'static str {
            "Flags entries without a value"
        }

        fn category(&self) -> RuleCategory {
            RuleCategory::Syntax
        }

        fn default_severity(&self) -> Severity {
            Severity::Info
        }

        fn applies_to(&self) -> &'static [NodeKind] {
            &[NodeKind::Entry]
        }

        fn evaluate(&self, _node: Node<'_>, _ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
            Vec::new()
        }
    }

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(EmptyValueRule)).unwrap();

        assert!(registry.contains("empty-value"));
        assert!(!registry.contains("nonexistent"));
        assert_eq!(registry.get("empty-value").unwrap().category(), RuleCategory::Syntax);
        assert_eq!(registry.rules_for(NodeKind::Entry).count(), 1);
        assert_eq!(registry.rules_for(NodeKind::Task).count(), 0);
    }

    #[test]
    fn test_duplicate_rule_id_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(EmptyValueRule)).unwrap();
        let err = registry.register(Arc::new(EmptyValueRule)).unwrap_err();
        assert!(matches!(err, LintError::DuplicateRuleId(id) if id == "empty-value"));
    }

    #[test]
    fn test_builtins_unique_and_ordered() {
        let registry = RuleRegistry::with_builtins().unwrap();
        let ids = registry.ids();
        assert_eq!(ids.first(), Some(&"quote-style"));
        assert!(ids.contains(&"include-spacing"));
        assert!(ids.contains(&"vault-extension"));
    }
}
