//! Module argument syntax and deprecated directives.

use crate::lint::builder::short_module_name;
use crate::lint::model::{Entry, RoleSyntax, Value};
use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::source::QuoteStyle;
use crate::lint::types::{Diagnostic, RuleCategory, Severity};

/// Modules whose primary argument is a free-form command line.
const FREE_FORM_MODULES: &[&str] = &[
    "command", "shell", "raw", "script", "win_command", "win_shell", "meta",
];

/// `key=value` options that free-form modules also accept as parameters.
const FREE_FORM_OPTIONS: &[&str] = &[
    "chdir=", "creates=", "removes=", "executable=", "warn=", "stdin=", "argv=",
];

/// Deprecated privilege escalation directives and their replacements.
const DEPRECATED_DIRECTIVES: &[(&str, &str)] = &[
    ("sudo", "become"),
    ("sudo_user", "become_user"),
    ("sudo_exe", "become_exe"),
    ("sudo_flags", "become_flags"),
    ("sudo_pass", "become_password"),
    ("su", "become"),
    ("su_user", "become_user"),
];

/// Module parameters and role parameters use multi-line mappings.
pub struct MapSyntaxRule;

impl Rule for MapSyntaxRule {
    fn id(&self) -> &'static str {
        "map-syntax"
    }

    fn description(&self) -> &'static str {
        "Module and role parameters are written as multi-line mappings, not inline strings"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Syntax
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Module, NodeKind::Role]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match node {
            Node::Module(module) => {
                let Value::Scalar(args) = &module.args else {
                    return Vec::new();
                };

                let free_form = FREE_FORM_MODULES.contains(&short_module_name(&module.name));
                let violation = if args.style == QuoteStyle::Flow {
                    true
                } else if free_form {
                    FREE_FORM_OPTIONS.iter().any(|opt| args.text.contains(opt))
                } else {
                    !args.text.trim().is_empty()
                };

                if !violation {
                    return Vec::new();
                }

                let message = if free_form {
                    format!(
                        "Options of module '{}' should be given under 'args' as a multi-line mapping",
                        module.name
                    )
                } else {
                    format!(
                        "Parameters of module '{}' should be a multi-line mapping, not an inline string",
                        module.name
                    )
                };
                vec![ctx
                    .report(self, args.position, message)
                    .with_suggestion("Put each parameter on its own line as 'key: value'")]
            }
            Node::Role(role) if role.syntax == RoleSyntax::Flow => {
                let name = role
                    .name
                    .as_ref()
                    .map(|n| n.text.as_str())
                    .unwrap_or("role");
                vec![ctx
                    .report(
                        self,
                        role.flow.as_ref().map(|f| f.position).unwrap_or(role.position),
                        format!("Parameters of role '{}' should be a multi-line mapping", name),
                    )
                    .with_suggestion("Use '- role: name' followed by one parameter per line")]
            }
            _ => Vec::new(),
        }
    }
}

/// Privilege escalation uses `become` instead of `sudo` or `su`.
pub struct SudoBecomeRule;

impl SudoBecomeRule {
    fn check_entries(&self, entries: &[Entry], ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        entries
            .iter()
            .filter_map(|entry| {
                let (old, new) = DEPRECATED_DIRECTIVES
                    .iter()
                    .find(|(old, _)| *old == entry.key)?;
                let suggestion = if old.starts_with("sudo") {
                    format!("Replace '{}' with '{}'", old, new)
                } else {
                    format!("Replace '{}' with '{}' and set 'become_method: su'", old, new)
                };
                Some(
                    ctx.report(
                        self,
                        entry.position,
                        format!("'{}' is deprecated, use '{}' instead", old, new),
                    )
                    .with_suggestion(suggestion),
                )
            })
            .collect()
    }
}

impl Rule for SudoBecomeRule {
    fn id(&self) -> &'static str {
        "sudo-become"
    }

    fn description(&self) -> &'static str {
        "Privilege escalation uses become instead of the deprecated sudo and su directives"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Deprecation
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::HostBlock, NodeKind::Task, NodeKind::Role, NodeKind::Include]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match node {
            Node::HostBlock(host) => self.check_entries(&host.entries, ctx),
            Node::Task(task) => self.check_entries(&task.entries, ctx),
            Node::Role(role) => self.check_entries(&role.entries, ctx),
            Node::Include(include) => self.check_entries(&include.entries, ctx),
            _ => Vec::new(),
        }
    }
}
