//! Identifier conventions for variables and roles.

use crate::lint::model::ScalarContext;
use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::types::{Diagnostic, Position, RuleCategory, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("variable pattern is valid"));

static ROLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$").expect("role pattern is valid")
});

/// Convert an identifier to lowercase words joined by underscores.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        match c {
            'A'..='Z' => {
                if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            }
            '-' | ' ' | '.' => out.push('_'),
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out
}

/// Assigned variable names are lowercase with underscores.
pub struct VariableNamingRule;

impl VariableNamingRule {
    fn check(&self, name: &str, position: Position, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        if name.contains("{{") || VARIABLE_NAME.is_match(name) {
            return Vec::new();
        }
        vec![ctx
            .report(
                self,
                position,
                format!(
                    "Variable name '{}' should be lowercase words separated by underscores",
                    name
                ),
            )
            .with_suggestion(snake_case(name))]
    }
}

impl Rule for VariableNamingRule {
    fn id(&self) -> &'static str {
        "variable-naming"
    }

    fn description(&self) -> &'static str {
        "Variable names use lowercase letters, digits and underscores"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Entry, NodeKind::Scalar]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match node {
            Node::Entry(entry) if entry.assigns_variable => {
                self.check(&entry.key, entry.position, ctx)
            }
            Node::Scalar(scalar) if scalar.context == ScalarContext::RegisteredVariable => {
                self.check(&scalar.text, scalar.position, ctx)
            }
            _ => Vec::new(),
        }
    }
}

/// Role names are lowercase with underscores, optionally namespaced.
pub struct RoleNamingRule;

impl Rule for RoleNamingRule {
    fn id(&self) -> &'static str {
        "role-naming"
    }

    fn description(&self) -> &'static str {
        "Role names are lowercase words joined by underscores"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Role]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Role(role) = node else {
            return Vec::new();
        };
        let Some(name) = &role.name else {
            return Vec::new();
        };
        // Templated names and paths to roles are outside the convention.
        if name.is_templated() || name.text.contains('/') || ROLE_NAME.is_match(&name.text) {
            return Vec::new();
        }

        let suggestion = name
            .text
            .split('.')
            .map(|part| snake_case(part).replace("__", "_"))
            .collect::<Vec<_>>()
            .join(".");
        vec![ctx
            .report(
                self,
                name.position,
                format!(
                    "Role name '{}' should be lowercase words separated by underscores",
                    name.text
                ),
            )
            .with_suggestion(suggestion)]
    }
}
