//! Include statement formatting.

use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::types::{Diagnostic, RuleCategory, Severity};

/// Include targets are bare filenames.
pub struct IncludeQuotingRule;

impl Rule for IncludeQuotingRule {
    fn id(&self) -> &'static str {
        "include-quoting"
    }

    fn description(&self) -> &'static str {
        "Include targets are written without quotes"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Quoting
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Include]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Include(include) = node else {
            return Vec::new();
        };
        // Templated targets may need quotes to be valid YAML.
        if !include.target.style.is_quoted() || include.target.text.starts_with("{{") {
            return Vec::new();
        }

        vec![ctx
            .report(
                self,
                include.target.position,
                format!(
                    "Target of '{}' should not be quoted: {}",
                    include.keyword, include.target.raw
                ),
            )
            .with_suggestion(include.target.text.clone())]
    }
}

/// Single-line includes are grouped; multi-line includes are separated.
pub struct IncludeSpacingRule;

impl Rule for IncludeSpacingRule {
    fn id(&self) -> &'static str {
        "include-spacing"
    }

    fn description(&self) -> &'static str {
        "Consecutive single-line includes have no blank line between them; multi-line includes are separated by one"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Spacing
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Include]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let (Node::Include(include), Some(Node::Include(previous))) = (node, ctx.previous) else {
            return Vec::new();
        };

        let multiline = include.is_multiline() || previous.is_multiline();
        let separated = include.blank_lines_before > 0;

        match (multiline, separated) {
            (true, false) => vec![ctx
                .report(
                    self,
                    include.position,
                    "Multi-line include statements should be separated by a blank line",
                )
                .with_suggestion("Insert a blank line before this include")],
            (false, true) => vec![ctx
                .report(
                    self,
                    include.position,
                    "Single-line include statements should not be separated by blank lines",
                )
                .with_suggestion("Remove the blank line before this include")],
            _ => Vec::new(),
        }
    }
}
