//! Property-based tests for Playstyle using proptest.
//!
//! Generated playbooks that follow every convention must lint clean, single
//! deviations must be reported exactly once, and arbitrary input must never
//! panic or produce order-dependent output.

use playstyle::prelude::*;
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::path::Path;

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// Modules that take a parameter mapping.
fn module_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("copy"),
        Just("file"),
        Just("service"),
        Just("template"),
        Just("user"),
    ]
}

fn param_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z_]{0,10}").unwrap()
}

/// String values that can never be read as a boolean, number or template.
fn string_value() -> impl Strategy<Value = String> {
    prop::string::string_regex("v[a-z0-9 /._-]{0,20}").unwrap()
}

fn task_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z ]{0,20}").unwrap()
}

fn snake_case_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,12}").unwrap()
}

fn camel_case_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,6}[A-Z][a-z]{0,6}").unwrap()
}

#[derive(Debug, Clone)]
struct GeneratedTask {
    name: String,
    module: &'static str,
    params: Vec<(String, String)>,
}

fn task() -> impl Strategy<Value = GeneratedTask> {
    (
        task_name(),
        module_name(),
        btree_set(param_name(), 1..5),
        vec(string_value(), 5),
    )
        .prop_map(|(name, module, keys, values)| GeneratedTask {
            name,
            module,
            params: keys.into_iter().zip(values).collect(),
        })
}

fn render(tasks: &[GeneratedTask]) -> String {
    let rendered: Vec<String> = tasks
        .iter()
        .map(|task| {
            let mut text = format!("    - name: \"{}\"\n      {}:\n", task.name, task.module);
            for (key, value) in &task.params {
                text.push_str(&format!("        {}: \"{}\"\n", key, value));
            }
            text
        })
        .collect();
    format!("- hosts: all\n  tasks:\n{}", rendered.join("\n"))
}

fn lint(source: &str) -> LintResult {
    Linter::new(LintConfig::default())
        .unwrap()
        .lint_content(source, Path::new("generated.yml"))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn conforming_playbooks_lint_clean(tasks in vec(task(), 1..6)) {
        let source = render(&tasks);
        let result = lint(&source);
        prop_assert!(
            result.diagnostics.is_empty(),
            "{}\n{:?}",
            source,
            result.render_lines()
        );
        prop_assert_eq!(result.tasks_analyzed, tasks.len());
    }

    #[test]
    fn unquoted_string_reported_once(tasks in vec(task(), 1..4), target in 0usize..4) {
        let target = target % tasks.len();
        let mut tasks = tasks;
        let (key, value) = tasks[target].params[0].clone();
        let bare = value.trim_end().replace(' ', "_");
        tasks[target].params[0] = (key, bare.clone());

        let source = render(&tasks).replace(&format!("\"{}\"", bare), &bare);
        let result = lint(&source);
        let quote_style: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.rule_id == "quote-style")
            .collect();
        prop_assert!(!quote_style.is_empty(), "{}", source);
        prop_assert!(result.diagnostics.iter().all(|d| d.rule_id == "quote-style"));
    }

    #[test]
    fn snake_case_variables_accepted(name in snake_case_name()) {
        let source = format!("- hosts: all\n  vars:\n    {}: 1\n", name);
        prop_assert!(lint(&source).diagnostics.is_empty());
    }

    #[test]
    fn camel_case_variables_rejected(name in camel_case_name()) {
        let source = format!("- hosts: all\n  vars:\n    {}: 1\n", name);
        let result = lint(&source);
        prop_assert_eq!(result.diagnostics.len(), 1);
        prop_assert_eq!(result.diagnostics[0].rule_id.as_str(), "variable-naming");
        prop_assert_eq!(result.diagnostics[0].location.line, 3);
    }

    #[test]
    fn arbitrary_input_never_panics(source in "\\PC{0,200}") {
        let first = lint(&source);
        let second = lint(&source);
        prop_assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn merge_order_does_not_change_output(tasks in vec(task(), 1..4), swap in any::<bool>()) {
        let linter = Linter::new(LintConfig::default()).unwrap();
        let clean = render(&tasks);
        let dirty = clean.replace("    - name:", "    - name:  ");

        let a = linter.lint_content(&clean, Path::new("a.yml"));
        let b = linter.lint_content(&dirty, Path::new("b.yml"));

        let mut forward = LintResult::new();
        let mut backward = LintResult::new();
        forward.merge(a.clone());
        forward.merge(b.clone());
        if swap {
            backward.merge(b);
            backward.merge(a);
        } else {
            backward.merge(a);
            backward.merge(b);
        }
        forward.finalize();
        backward.finalize();

        prop_assert_eq!(forward.render_lines(), backward.render_lines());
    }
}
