//! Library-level tests for the playbook linter.
//!
//! These tests drive the public `Linter` API with whole playbooks and check
//! the diagnostics a user would see.

use playstyle::prelude::*;
use pretty_assertions::assert_eq;
use std::path::Path;

const SAMPLE: &str = include_str!("fixtures/sample.yml");

fn lint(source: &str) -> LintResult {
    lint_with(LintConfig::default(), source)
}

fn lint_with(config: LintConfig, source: &str) -> LintResult {
    Linter::new(config)
        .unwrap()
        .lint_content(source, Path::new("site.yml"))
}

/// (line, rule id) pairs in reporter order.
fn findings(result: &LintResult) -> Vec<(usize, &str)> {
    result
        .diagnostics
        .iter()
        .map(|d| (d.location.line, d.rule_id.as_str()))
        .collect()
}

// ============================================================================
// Conforming input
// ============================================================================

#[test]
fn test_sample_playbook_is_clean() {
    let result = lint(SAMPLE);
    assert_eq!(result.render_lines(), Vec::<String>::new());
    assert_eq!(result.plays_analyzed, 2);
    assert_eq!(result.tasks_analyzed, 6);
    assert_eq!(result.exit_code(FailOn::Warning), 0);
}

#[test]
fn test_evaluation_is_deterministic() {
    let source = include_str!("fixtures/violations.yml");
    let first = lint(source);
    let second = lint(source);
    assert!(!first.diagnostics.is_empty());
    assert_eq!(first.diagnostics, second.diagnostics);
}

// ============================================================================
// Quoting
// ============================================================================

#[test]
fn test_unquoted_module_string() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "start robot"
      service:
        name: s1m0ne
        state: "started"
"#,
    );
    assert_eq!(findings(&result), vec![(5, "quote-style")]);
    assert_eq!(
        result.diagnostics[0].suggestion.as_deref(),
        Some("\"s1m0ne\"")
    );
    assert_eq!(result.exit_code(FailOn::Error), 1);
}

#[test]
fn test_quoted_boolean_module_parameter_reported_once() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "enable robot"
      service:
        enabled: "true"
        name: "robot"
"#,
    );
    assert_eq!(findings(&result), vec![(5, "quote-style")]);
}

#[test]
fn test_yes_as_task_option_reported_once() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "install"
      apt:
        name: "nginx"
      become: "yes"
"#,
    );
    assert_eq!(findings(&result), vec![(6, "boolean-literal")]);
    assert!(result.diagnostics[0].message.contains("'true'"));
}

#[test]
fn test_conditionals_exempt_from_boolean_rules() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "always"
      ping:
      when: yes
"#,
    );
    assert!(result.diagnostics.is_empty(), "{:?}", result.render_lines());
}

// ============================================================================
// Spacing
// ============================================================================

#[test]
fn test_single_line_includes_must_be_adjacent() {
    let result = lint("- include: a.yml\n\n- include: b.yml\n");
    assert_eq!(findings(&result), vec![(3, "include-spacing")]);
}

#[test]
fn test_multiline_include_needs_blank_line() {
    let result = lint(
        r#"- include: a.yml
  vars:
    release: 2
- include: b.yml
"#,
    );
    assert_eq!(findings(&result), vec![(4, "include-spacing")]);
}

#[test]
fn test_jinja_spacing() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "show"
      debug:
        msg: "{{myvar}}"
"#,
    );
    assert_eq!(findings(&result), vec![(5, "jinja-spacing")]);
    assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    assert_eq!(result.exit_code(FailOn::Error), 0);
    assert_eq!(result.exit_code(FailOn::Warning), 1);
}

// ============================================================================
// Ordering and naming
// ============================================================================

#[test]
fn test_tasks_before_roles() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "ping"
      ping:
  roles:
    - common
"#,
    );
    assert_eq!(findings(&result), vec![(5, "host-block-order")]);
}

#[test]
fn test_camel_case_variable() {
    let result = lint(
        r#"- hosts: all
  vars:
    myBoolean: true
"#,
    );
    assert_eq!(findings(&result), vec![(3, "variable-naming")]);
    assert_eq!(
        result.diagnostics[0].suggestion.as_deref(),
        Some("my_boolean")
    );
}

#[test]
fn test_collection_qualified_module_names() {
    let playbook = |prefix: &str| {
        format!(
            r#"- hosts: all
  tasks:
    - name: "check"
      {0}assert:
        that:
          - my_var is defined

    - name: "show"
      {0}debug:
        var: my_var

    - name: "remember"
      {0}set_fact:
        myBoolean: true
"#,
            prefix
        )
    };

    let short = lint(&playbook(""));
    assert_eq!(findings(&short), vec![(14, "variable-naming")]);

    for prefix in ["ansible.builtin.", "ansible.legacy."] {
        let qualified = lint(&playbook(prefix));
        assert_eq!(findings(&qualified), findings(&short), "prefix {}", prefix);
    }
}

#[test]
fn test_task_keyword_before_module() {
    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "a"
      ping:
      become_exe: "sudo"
      collections:
        - "community.general"
"#,
    );
    assert!(result.diagnostics.is_empty(), "{:?}", result.render_lines());

    let result = lint(
        r#"- hosts: all
  tasks:
    - name: "a"
      become_exe: "sudo"
      ping:
"#,
    );
    assert_eq!(findings(&result), vec![(5, "task-field-order")]);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_disabled_rule_is_silent() {
    let config = LintConfig {
        skip_rules: vec!["jinja-spacing".to_string()],
        ..Default::default()
    };
    let result = lint_with(
        config,
        "- hosts: all\n  tasks:\n    - name: \"show\"\n      debug:\n        msg: \"{{myvar}}\"\n",
    );
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_relaxed_config_hides_warnings() {
    let result = lint_with(LintConfig::relaxed(), include_str!("fixtures/violations.yml"));
    assert!(!result.diagnostics.is_empty());
    assert!(result.diagnostics.iter().all(Diagnostic::is_error));
}

#[test]
fn test_yaml_extension_policy() {
    let linter = Linter::new(LintConfig::default()).unwrap();
    let result = linter.lint_content(SAMPLE, Path::new("site.yaml"));
    assert_eq!(findings(&result), vec![(1, "file-extension")]);

    let config = LintConfig {
        extensions: ExtensionPolicy::YmlYaml,
        ..Default::default()
    };
    let linter = Linter::new(config).unwrap();
    assert!(linter
        .lint_content(SAMPLE, Path::new("site.yaml"))
        .diagnostics
        .is_empty());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_parse_error_is_isolated() {
    let result = lint("- hosts: \"all\n  tasks: []\n");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].rule_id, "parse-error");
    assert_eq!(result.exit_code(FailOn::None), 2);
}

#[test]
fn test_task_list_is_malformed() {
    let result = lint("- name: \"ping\"\n  ping:\n");
    assert_eq!(findings(&result), vec![(1, "malformed-playbook")]);
}

// ============================================================================
// Custom rules
// ============================================================================

/// Every task must carry a name.
struct TaskNameRule;

impl Rule for TaskNameRule {
    fn id(&self) -> &'static str {
        "task-name"
    }

    fn description(&self) -> &'static str {
        "Tasks are named"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Task]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match node {
            Node::Task(task) if task.name.is_none() => {
                vec![ctx.report(self, task.position, "Task has no name")]
            }
            _ => Vec::new(),
        }
    }
}

#[test]
fn test_custom_rule_registry() {
    let mut registry = RuleRegistry::with_builtins().unwrap();
    registry.register(Arc::new(TaskNameRule)).unwrap();
    assert!(matches!(
        registry.register(Arc::new(TaskNameRule)),
        Err(LintError::DuplicateRuleId(id)) if id == "task-name"
    ));

    let config = LintConfig {
        only_rules: vec!["task-name".to_string()],
        ..Default::default()
    };
    let linter = Linter::with_registry(config, Arc::new(registry)).unwrap();
    let result = linter.lint_content(
        "- hosts: all\n  tasks:\n    - ping:\n\n    - name: \"named\"\n      ping:\n",
        Path::new("site.yml"),
    );
    assert_eq!(findings(&result), vec![(3, "task-name")]);
}
