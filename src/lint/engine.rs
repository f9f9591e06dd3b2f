//! Rule evaluation engine.
//!
//! Walks a [`PlaybookDocument`] depth-first and hands every node to the rules
//! subscribed to its kind. Sibling nodes in the same list see their
//! predecessor through [`RuleContext::previous`].

use super::model::{
    Block, Entry, HostBlock, IncludeStatement, PlaybookDocument, RoleRef, RoleSyntax,
    SectionItems, Task, TaskItem, Value,
};
use super::registry::{Node, RuleContext, RuleRegistry};
use super::types::{Diagnostic, LintConfig};
use tracing::trace;

/// Evaluates registered rules against documents.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> Engine<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    /// Run every enabled rule over the document.
    ///
    /// Diagnostics come back in traversal order; callers sort them.
    pub fn evaluate(&self, document: &PlaybookDocument, config: &LintConfig) -> Vec<Diagnostic> {
        let mut walker = Walker {
            registry: self.registry,
            config,
            document,
            diagnostics: Vec::new(),
        };
        walker.document();
        trace!(
            path = %document.path.display(),
            count = walker.diagnostics.len(),
            "evaluated document"
        );
        walker.diagnostics
    }
}

struct Walker<'a> {
    registry: &'a RuleRegistry,
    config: &'a LintConfig,
    document: &'a PlaybookDocument,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, node: Node<'a>, previous: Option<Node<'a>>) {
        let ctx = RuleContext {
            path: self.document.path(),
            config: self.config,
            document: self.document,
            previous,
        };

        let config = self.config;
        for rule in self.registry.rules_for(node.kind()) {
            if !config.should_run_rule(rule.id(), rule.category()) {
                continue;
            }
            self.diagnostics.extend(
                rule.evaluate(node, &ctx)
                    .into_iter()
                    .filter(|d| config.reports(d.severity)),
            );
        }
    }

    fn document(&mut self) {
        let document = self.document;
        self.visit(Node::Document(document), None);

        let mut previous = None;
        for block in &document.blocks {
            let node = match block {
                Block::Host(host) => Node::HostBlock(host),
                Block::Include(include) => Node::Include(include),
            };
            self.visit(node, previous);
            match block {
                Block::Host(host) => self.host_block(host),
                Block::Include(include) => self.include(include),
            }
            previous = Some(node);
        }
    }

    /// Fields are visited in source order.
    fn host_block(&mut self, host: &'a HostBlock) {
        for field in &host.fields {
            if let Some(entry) = host.entry(&field.key) {
                self.entry(entry);
                continue;
            }
            let Some(section) = host.sections.iter().find(|s| s.position == field.position) else {
                continue;
            };
            match &section.items {
                SectionItems::Tasks(items) => self.task_items(items),
                SectionItems::Roles(roles) => {
                    let mut previous = None;
                    for role in roles {
                        let node = Node::Role(role);
                        self.visit(node, previous);
                        self.role(role);
                        previous = Some(node);
                    }
                }
            }
        }
    }

    fn role(&mut self, role: &'a RoleRef) {
        match role.syntax {
            RoleSyntax::Bare => {
                if let Some(name) = &role.name {
                    self.visit(Node::Scalar(name), None);
                }
            }
            RoleSyntax::Flow => {
                if let Some(flow) = &role.flow {
                    self.visit(Node::Scalar(flow), None);
                }
            }
            RoleSyntax::Mapping => {
                for entry in &role.entries {
                    self.entry(entry);
                }
            }
        }
    }

    fn task_items(&mut self, items: &'a [TaskItem]) {
        let mut previous = None;
        for item in items {
            let node = match item {
                TaskItem::Task(task) => Node::Task(task),
                TaskItem::Include(include) => Node::Include(include),
            };
            self.visit(node, previous);
            match item {
                TaskItem::Task(task) => self.task(task),
                TaskItem::Include(include) => self.include(include),
            }
            previous = Some(node);
        }
    }

    /// Fields are visited in source order.
    fn task(&mut self, task: &'a Task) {
        for field in &task.fields {
            if let Some(entry) = task.entry(&field.key) {
                self.entry(entry);
            } else if let Some(block) = task.blocks.iter().find(|b| b.key == field.key) {
                self.task_items(&block.items);
            } else if let Some(module) = task.module.as_ref().filter(|m| m.name == field.key) {
                self.visit(Node::Module(module), None);
                self.value(&module.args);
            }
        }
    }

    fn include(&mut self, include: &'a IncludeStatement) {
        self.visit(Node::Scalar(&include.target), None);
        for entry in &include.entries {
            self.entry(entry);
        }
    }

    fn entry(&mut self, entry: &'a Entry) {
        self.visit(Node::Entry(entry), None);
        self.value(&entry.value);
    }

    fn value(&mut self, value: &'a Value) {
        match value {
            Value::Scalar(scalar) => self.visit(Node::Scalar(scalar), None),
            Value::Mapping(entries) => {
                for entry in entries {
                    self.entry(entry);
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    self.value(item);
                }
            }
            Value::Null => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::builder::DocumentBuilder;
    use crate::lint::registry::{NodeKind, Rule};
    use crate::lint::types::{RuleCategory, Severity};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Records every node it sees together with its predecessor's line.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(NodeKind, usize, Option<usize>)>>,
    }

    impl Rule for Recorder {
        fn id(&self) -> &'static str {
            "recorder"
        }

        fn description(&self) -> &'static str {
            "Records visited nodes"
        }

        fn category(&self) -> RuleCategory {
            RuleCategory::Syntax
        }

        fn default_severity(&self) -> Severity {
            Severity::Info
        }

        fn applies_to(&self) -> &'static [NodeKind] {
            &[
                NodeKind::HostBlock,
                NodeKind::Task,
                NodeKind::Include,
                NodeKind::Conditional,
            ]
        }

        fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
            self.seen.lock().unwrap().push((
                node.kind(),
                node.position().line,
                ctx.previous.map(|p| p.position().line),
            ));
            vec![ctx.report(self, node.position(), "seen")]
        }
    }

    const PLAYBOOK: &str = r#"- include: base.yml

- hosts: all
  tasks:
    - name: "first"
      ping:

    - name: "second"
      ping:
      when: ready
"#;

    fn run(config: &LintConfig) -> (Vec<Diagnostic>, Vec<(NodeKind, usize, Option<usize>)>) {
        let recorder = Arc::new(Recorder::default());
        let mut registry = RuleRegistry::new();
        registry.register(recorder.clone()).unwrap();

        let document = DocumentBuilder::parse(Path::new("site.yml"), PLAYBOOK).unwrap();
        let diagnostics = Engine::new(&registry).evaluate(&document, config);
        let seen = recorder.seen.lock().unwrap().clone();
        (diagnostics, seen)
    }

    #[test]
    fn test_walk_passes_previous_sibling() {
        let (diagnostics, seen) = run(&LintConfig::default());
        assert_eq!(
            seen,
            vec![
                (NodeKind::Include, 1, None),
                (NodeKind::HostBlock, 3, Some(1)),
                (NodeKind::Task, 5, None),
                (NodeKind::Task, 8, Some(5)),
                (NodeKind::Conditional, 10, None),
            ]
        );
        assert_eq!(diagnostics.len(), 5);
    }

    #[test]
    fn test_disabled_rule_not_evaluated() {
        let config = LintConfig {
            skip_rules: vec!["recorder".to_string()],
            ..Default::default()
        };
        let (diagnostics, seen) = run(&config);
        assert!(diagnostics.is_empty());
        assert!(seen.is_empty());
    }

    #[test]
    fn test_min_severity_filters() {
        let config = LintConfig::relaxed();
        let (diagnostics, seen) = run(&config);
        assert!(diagnostics.is_empty());
        assert_eq!(seen.len(), 5);
    }
}
