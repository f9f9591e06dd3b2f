//! Ordering of host block sections and task fields.

use crate::lint::model::{Entry, HostFieldKind, TaskFieldKind};
use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::types::{Diagnostic, Position, RuleCategory, Severity};

/// Report each key that sorts before its predecessor.
fn unsorted<'a>(
    keys: impl IntoIterator<Item = (&'a str, Position)>,
) -> Vec<(&'a str, &'a str, Position)> {
    let mut previous: Option<&str> = None;
    let mut out = Vec::new();
    for (key, position) in keys {
        if let Some(prev) = previous {
            if key < prev {
                out.push((key, prev, position));
            }
        }
        previous = Some(key);
    }
    out
}

/// Host blocks: declaration, options, pre_tasks, roles, tasks, post_tasks, handlers.
pub struct HostBlockOrderRule;

impl Rule for HostBlockOrderRule {
    fn id(&self) -> &'static str {
        "host-block-order"
    }

    fn description(&self) -> &'static str {
        "Host block sections follow the fixed order and host options are sorted alphabetically"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Ordering
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::HostBlock]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::HostBlock(host) = node else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();

        let mut furthest: Option<(HostFieldKind, &str)> = None;
        for field in &host.fields {
            match furthest {
                Some((kind, key)) if field.kind < kind => {
                    diagnostics.push(
                        ctx.report(
                            self,
                            field.position,
                            format!("Section '{}' should appear before '{}'", field.key, key),
                        )
                        .with_suggestion(
                            "Order host blocks as: hosts, host options, pre_tasks, roles, tasks, post_tasks, handlers",
                        ),
                    );
                }
                Some((kind, _)) if field.kind == kind => {}
                _ => furthest = Some((field.kind, field.key.as_str())),
            }
        }

        let options = host
            .fields
            .iter()
            .filter(|f| f.kind == HostFieldKind::Option)
            .map(|f| (f.key.as_str(), f.position));
        for (key, prev, position) in unsorted(options) {
            diagnostics.push(ctx.report(
                self,
                position,
                format!("Host option '{}' should be sorted alphabetically before '{}'", key, prev),
            ));
        }

        diagnostics
    }
}

/// Tasks: name, vars, module, loop, then options; options and parameters sorted.
pub struct TaskFieldOrderRule;

impl TaskFieldOrderRule {
    fn params(&self, entries: &[Entry], module: &str, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        unsorted(entries.iter().map(|e| (e.key.as_str(), e.position)))
            .into_iter()
            .map(|(key, prev, position)| {
                ctx.report(
                    self,
                    position,
                    format!(
                        "Parameter '{}' of module '{}' should be sorted alphabetically before '{}'",
                        key, module, prev
                    ),
                )
            })
            .collect()
    }
}

impl Rule for TaskFieldOrderRule {
    fn id(&self) -> &'static str {
        "task-field-order"
    }

    fn description(&self) -> &'static str {
        "Task fields follow the order name, vars, module, loop, options; options and module parameters are sorted alphabetically"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Ordering
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Task]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Node::Task(task) = node else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();

        let mut furthest: Option<(TaskFieldKind, &str)> = None;
        for field in &task.fields {
            match furthest {
                Some((kind, key)) if field.kind < kind => {
                    diagnostics.push(
                        ctx.report(
                            self,
                            field.position,
                            format!("Field '{}' should appear before '{}'", field.key, key),
                        )
                        .with_suggestion("Order task fields as: name, vars, module, loop, options"),
                    );
                }
                Some((kind, _)) if field.kind == kind => {}
                _ => furthest = Some((field.kind, field.key.as_str())),
            }
        }

        if let Some(module) = &task.module {
            if let Some(params) = module.params() {
                diagnostics.extend(self.params(params, &module.name, ctx));
            }
        }

        let options = task
            .fields
            .iter()
            .filter(|f| f.kind == TaskFieldKind::Option)
            .map(|f| (f.key.as_str(), f.position));
        for (key, prev, position) in unsorted(options) {
            diagnostics.push(ctx.report(
                self,
                position,
                format!("Task option '{}' should be sorted alphabetically before '{}'", key, prev),
            ));
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{check, lines};

    #[test]
    fn test_tasks_before_roles() {
        let source = "- hosts: all\n  tasks:\n    - ping:\n  roles:\n    - common\n";
        let diags = check("host-block-order", source);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].location.line, 4);
        assert!(diags[0].message.contains("'roles' should appear before 'tasks'"));
    }

    #[test]
    fn test_host_options_sorted() {
        let source = r#"- hosts: all
  remote_user: "deploy"
  become: true
  gather_facts: false
  pre_tasks:
    - ping:
  roles:
    - common
  tasks:
    - ping:
  handlers:
    - ping:
"#;
        let diags = check("host-block-order", source);
        assert_eq!(lines(&diags), vec![3]);
        assert!(diags[0].message.contains("'become'"));
    }

    #[test]
    fn test_option_after_section() {
        let source = "- hosts: all\n  tasks:\n    - ping:\n  become: true\n";
        assert_eq!(lines(&check("host-block-order", source)), vec![4]);
    }

    #[test]
    fn test_task_field_order() {
        let source = r#"- hosts: all
  tasks:
    - service:
        name: "httpd"
      name: "restart"
    - name: "install"
      vars:
        pkg: "httpd"
      yum:
        state: "present"
        name: "{{ pkg }}"
      with_items: "{{ packages }}"
      when: install
      become: true
"#;
        let diags = check("task-field-order", source);
        assert_eq!(lines(&diags), vec![5, 11, 14]);
    }

    #[test]
    fn test_conforming_task() {
        let source = r#"- hosts: all
  tasks:
    - name: "install"
      yum:
        name: "httpd"
        state: "present"
      loop: "{{ packages }}"
      become: true
      register: result
      when: install
"#;
        assert!(check("task-field-order", source).is_empty());
    }
}
