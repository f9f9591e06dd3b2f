//! Whitespace rules: key spacing, blank lines, indentation and Jinja delimiters.

use crate::lint::model::Scalar;
use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::source::KeySpacing;
use crate::lint::types::{Diagnostic, Position, RuleCategory, Severity};

/// Exactly one space after the colon of every `key: value` pair.
pub struct KeySpacingRule;

impl KeySpacingRule {
    fn check(
        &self,
        key: &str,
        position: Position,
        spacing: KeySpacing,
        ctx: &RuleContext<'_>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if spacing.before_colon > 0 {
            diagnostics.push(
                ctx.report(
                    self,
                    position,
                    format!("Unexpected space before the colon after '{}'", key),
                )
                .with_suggestion(format!("{}: ...", key)),
            );
        }
        if spacing.tab_after_colon {
            diagnostics.push(
                ctx.report(
                    self,
                    position,
                    format!("Expected a space after the colon of '{}', found a tab", key),
                )
                .with_suggestion(format!("{}: ...", key)),
            );
        } else if let Some(after) = spacing.after_colon.filter(|n| *n != 1) {
            diagnostics.push(
                ctx.report(
                    self,
                    position,
                    format!(
                        "Expected exactly one space after the colon of '{}', found {}",
                        key, after
                    ),
                )
                .with_suggestion(format!("{}: ...", key)),
            );
        }
        diagnostics
    }
}

impl Rule for KeySpacingRule {
    fn id(&self) -> &'static str {
        "key-spacing"
    }

    fn description(&self) -> &'static str {
        "Exactly one space follows the colon of each key"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Spacing
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Entry, NodeKind::Module, NodeKind::Include]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match node {
            Node::Entry(entry) => self.check(&entry.key, entry.position, entry.spacing, ctx),
            Node::Module(module) => self.check(&module.name, module.position, module.spacing, ctx),
            Node::Include(include) => self.check(
                &include.keyword,
                include.keyword_position,
                include.spacing,
                ctx,
            ),
            _ => Vec::new(),
        }
    }
}

/// Blank line between adjacent host blocks and adjacent tasks.
pub struct BlockSpacingRule;

impl Rule for BlockSpacingRule {
    fn id(&self) -> &'static str {
        "block-spacing"
    }

    fn description(&self) -> &'static str {
        "Adjacent host blocks and tasks are separated by a blank line"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Spacing
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::HostBlock, NodeKind::Task, NodeKind::Include]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(previous) = ctx.previous else {
            return Vec::new();
        };
        let (what, blank_lines, position) = match (node, previous) {
            // Include-to-include spacing has its own rule.
            (Node::Include(_), Node::Include(_)) => return Vec::new(),
            (Node::HostBlock(host), _) => ("host block", host.blank_lines_before, host.position),
            (Node::Task(task), _) => ("task", task.blank_lines_before, task.position),
            (Node::Include(include), _) => ("include", include.blank_lines_before, include.position),
            _ => return Vec::new(),
        };

        if blank_lines > 0 {
            return Vec::new();
        }
        vec![ctx
            .report(
                self,
                position,
                format!(
                    "Missing blank line before {} (previous item ends on line {})",
                    what,
                    previous.end_line()
                ),
            )
            .with_suggestion(format!("Insert a blank line before this {}", what))]
    }
}

/// Two-space indentation without tabs.
pub struct IndentationRule;

impl Rule for IndentationRule {
    fn id(&self) -> &'static str {
        "indentation"
    }

    fn description(&self) -> &'static str {
        "Lines are indented with spaces in multiples of two"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Spacing
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Document]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Document(document) = node else {
            return Vec::new();
        };
        if document.encrypted {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        for (number, line) in document.source.iter() {
            let content = line.trim_start_matches([' ', '\t']);
            if content.is_empty() || content.starts_with('#') || document.is_verbatim(number) {
                continue;
            }
            let leading = &line[..line.len() - content.len()];

            if let Some(offset) = leading.find('\t') {
                diagnostics.push(
                    ctx.report(
                        self,
                        Position::new(number, offset + 1),
                        "Tab character used for indentation",
                    )
                    .with_suggestion("Indent with spaces"),
                );
            } else if leading.len() % 2 != 0 {
                diagnostics.push(
                    ctx.report(
                        self,
                        Position::new(number, 1),
                        format!(
                            "Indentation of {} spaces is not a multiple of two",
                            leading.len()
                        ),
                    )
                    .with_suggestion("Indent nested blocks by two spaces"),
                );
            }
        }
        diagnostics
    }
}

/// Exactly one space inside `{{` and `}}`.
pub struct JinjaSpacingRule;

/// A `{{ ... }}` expression whose inner padding is wrong.
#[derive(Debug, PartialEq, Eq)]
struct BadExpression<'a> {
    expression: &'a str,
    inner: &'a str,
}

/// Whitespace padding is exactly one space, or spans a line break.
fn padding_ok(padding: &str) -> bool {
    padding == " " || padding.contains('\n')
}

fn bad_expressions(text: &str) -> Vec<BadExpression<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let expression = &rest[open..open + 2 + close + 2];
        let inner = &after_open[..close];
        rest = &after_open[close + 2..];

        // Whitespace control markers belong to the delimiters.
        let body = inner.strip_prefix(['-', '+']).unwrap_or(inner);
        let body = body.strip_suffix(['-', '+']).unwrap_or(body);
        let trimmed = body.trim();
        if trimmed.is_empty() {
            continue;
        }

        let leading = &body[..body.len() - body.trim_start().len()];
        let trailing = &body[body.trim_end().len()..];
        if !padding_ok(leading) || !padding_ok(trailing) {
            out.push(BadExpression {
                expression,
                inner: trimmed,
            });
        }
    }
    out
}

impl JinjaSpacingRule {
    fn check(&self, scalar: &Scalar, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        bad_expressions(&scalar.text)
            .into_iter()
            .map(|bad| {
                ctx.report(
                    self,
                    scalar.position,
                    format!(
                        "Jinja expression {} should have exactly one space inside its delimiters",
                        bad.expression
                    ),
                )
                .with_suggestion(format!("{{{{ {} }}}}", bad.inner))
            })
            .collect()
    }
}

impl Rule for JinjaSpacingRule {
    fn id(&self) -> &'static str {
        "jinja-spacing"
    }

    fn description(&self) -> &'static str {
        "Jinja expressions have exactly one space inside the {{ }} delimiters"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Spacing
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Scalar, NodeKind::Conditional]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match node {
            Node::Scalar(scalar) => self.check(scalar, ctx),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{check, lines};
    use super::*;

    #[test]
    fn test_key_spacing() {
        let source = r#"- hosts: all
  tasks:
    - name:  "two spaces"
      debug :
        msg: "hi"
    - name: "fine"
      ping:
"#;
        let diags = check("key-spacing", source);
        assert_eq!(lines(&diags), vec![3, 4]);
        assert!(diags[0].message.contains("found 2"));
        assert!(diags[1].message.contains("before the colon"));
    }

    #[test]
    fn test_tab_after_colon() {
        let source = "- hosts: all\n  tasks:\n    - name:\t\"a\"\n      ping:\n";
        let diags = check("key-spacing", source);
        assert_eq!(lines(&diags), vec![3]);
        assert!(diags[0].message.contains("found a tab"));
    }

    #[test]
    fn test_block_spacing() {
        let source = r#"- hosts: web
  tasks:
    - name: "a"
      ping:
    - name: "b"
      ping:

    - name: "c"
      ping:
- hosts: db
  tasks:
    - ping:
"#;
        assert_eq!(lines(&check("block-spacing", source)), vec![5, 10]);
    }

    #[test]
    fn test_block_spacing_ignores_include_pairs() {
        let source = "- include: a.yml\n- include: b.yml\n- hosts: all\n  tasks: []\n";
        assert_eq!(lines(&check("block-spacing", source)), vec![3]);
    }

    #[test]
    fn test_indentation() {
        let source = "- hosts: all\n  tasks:\n     - name: \"odd\"\n       ping:\n";
        let diags = check("indentation", source);
        assert_eq!(lines(&diags), vec![3, 4]);
    }

    #[test]
    fn test_indentation_skips_block_scalars() {
        let source = "- hosts: all\n  tasks:\n    - copy:\n        content: |\n           indented three\n        dest: \"/x\"\n";
        assert!(check("indentation", source).is_empty());
    }

    #[test]
    fn test_jinja_spacing() {
        let source = r#"- hosts: all
  tasks:
    - debug:
        msg: "{{myvar}}"
    - debug:
        msg: "{{ myvar }}"
    - debug:
        msg: "{{- myvar -}} and {{  other }}"
      when: "{{x}}"
"#;
        let diags = check("jinja-spacing", source);
        assert_eq!(lines(&diags), vec![4, 8, 9]);
        assert_eq!(diags[0].suggestion.as_deref(), Some("{{ myvar }}"));
    }

    #[test]
    fn test_bad_expressions() {
        assert!(bad_expressions("{{ a }} {{ b | default('x') }}").is_empty());
        assert!(bad_expressions("{{- a -}}").is_empty());
        assert!(bad_expressions("{{ }}").is_empty());
        assert_eq!(bad_expressions("{{a }}").len(), 1);
        assert_eq!(bad_expressions("x {{ a}} y {{b}}").len(), 2);
        assert!(bad_expressions("unterminated {{ a").is_empty());
    }
}
