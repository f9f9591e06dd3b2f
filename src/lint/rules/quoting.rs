//! Quoting of scalar values.

use crate::lint::model::{Scalar, ScalarContext, ValueKind};
use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::source::QuoteStyle;
use crate::lint::types::{Diagnostic, RuleCategory, Severity};

fn describe(scalar: &Scalar) -> String {
    match &scalar.key {
        Some(key) => format!("'{}'", key),
        None => format!("of module '{}'", scalar.module.as_deref().unwrap_or("?")),
    }
}

/// Module parameters: strings double-quoted, everything else bare.
pub struct QuoteStyleRule;

impl Rule for QuoteStyleRule {
    fn id(&self) -> &'static str {
        "quote-style"
    }

    fn description(&self) -> &'static str {
        "Module parameter strings are double-quoted; booleans, numbers, variable names and conditionals are not quoted"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Quoting
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Scalar(scalar) = node else {
            return Vec::new();
        };
        if scalar.context != ScalarContext::ModuleParam {
            return Vec::new();
        }

        let diagnostic = match (scalar.kind, scalar.style) {
            (_, QuoteStyle::Flow | QuoteStyle::Folded | QuoteStyle::Literal) => None,
            (ValueKind::Null, _) => None,
            (ValueKind::String, QuoteStyle::Double) => None,
            // Single quotes are accepted when they avoid escaping inner double quotes.
            (ValueKind::String, QuoteStyle::Single) if scalar.text.contains('"') => None,
            (ValueKind::String, QuoteStyle::Single) => Some(
                ctx.report(
                    self,
                    scalar.position,
                    format!("String value {} should use double quotes, not single quotes", describe(scalar)),
                )
                .with_suggestion(format!("\"{}\"", scalar.text)),
            ),
            (ValueKind::String, QuoteStyle::Unquoted) => Some(
                ctx.report(
                    self,
                    scalar.position,
                    format!("String value {} should be double-quoted", describe(scalar)),
                )
                .with_suggestion(format!("\"{}\"", scalar.text)),
            ),
            (kind, style) if style.is_quoted() => Some(
                ctx.report(
                    self,
                    scalar.position,
                    format!("{} value {} should not be quoted", capitalize(kind), describe(scalar)),
                )
                .with_suggestion(scalar.text.clone()),
            ),
            _ => None,
        };

        diagnostic.into_iter().collect()
    }
}

fn capitalize(kind: ValueKind) -> String {
    let text = kind.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

/// Booleans are written as bare `true` or `false`.
pub struct BooleanLiteralRule;

impl Rule for BooleanLiteralRule {
    fn id(&self) -> &'static str {
        "boolean-literal"
    }

    fn description(&self) -> &'static str {
        "Boolean values are written as unquoted true or false"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Quoting
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Scalar(scalar) = node else {
            return Vec::new();
        };
        if scalar.kind != ValueKind::Boolean {
            return Vec::new();
        }

        let canonical = canonical_boolean(&scalar.text);
        if scalar.text != canonical {
            return vec![ctx
                .report(
                    self,
                    scalar.position,
                    format!("Boolean value {} should be '{}'", scalar.raw, canonical),
                )
                .with_suggestion(canonical)];
        }

        // Quoted canonical tokens in module parameters belong to quote-style.
        if scalar.style.is_quoted() && scalar.context != ScalarContext::ModuleParam {
            return vec![ctx
                .report(
                    self,
                    scalar.position,
                    format!("Boolean value {} should not be quoted", scalar.raw),
                )
                .with_suggestion(canonical)];
        }

        Vec::new()
    }
}

/// Canonical spelling of a boolean token.
fn canonical_boolean(token: &str) -> &'static str {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => "true",
        _ => "false",
    }
}
