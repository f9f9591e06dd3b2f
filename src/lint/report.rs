//! Diagnostics reporter.
//!
//! Collects diagnostics from any number of files, orders them
//! deterministically and decides the exit code.

use super::types::{Diagnostic, FailOn, LintError, Severity};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One diagnostic as emitted in JSON-lines output.
#[derive(Debug, Serialize)]
struct JsonDiagnostic<'a> {
    file: String,
    line: usize,
    column: usize,
    rule_id: &'a str,
    severity: Severity,
    category: String,
    message: &'a str,
    suggestion: Option<&'a str>,
}

/// Result of linting one or more files.
#[derive(Debug, Clone, Default)]
pub struct LintResult {
    /// Diagnostics found, sorted once [`finalize`](Self::finalize) runs.
    pub diagnostics: Vec<Diagnostic>,
    /// Files that were analyzed.
    pub files_analyzed: Vec<PathBuf>,
    /// Files that could not be evaluated (read, parse or timeout errors).
    pub failed_files: Vec<PathBuf>,
    /// Total number of host blocks analyzed.
    pub plays_analyzed: usize,
    /// Total number of tasks analyzed.
    pub tasks_analyzed: usize,
}

impl LintResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Result for a file whose evaluation was aborted.
    pub fn failed(path: &Path, error: &LintError) -> Self {
        Self {
            diagnostics: vec![error.to_diagnostic(path)],
            files_analyzed: vec![path.to_path_buf()],
            failed_files: vec![path.to_path_buf()],
            ..Default::default()
        }
    }

    /// Add multiple diagnostics.
    pub fn add_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: LintResult) {
        self.diagnostics.extend(other.diagnostics);
        self.files_analyzed.extend(other.files_analyzed);
        self.failed_files.extend(other.failed_files);
        self.plays_analyzed += other.plays_analyzed;
        self.tasks_analyzed += other.tasks_analyzed;
    }

    /// Sort by (file, line, column, rule id) and drop exact duplicates.
    pub fn finalize(&mut self) {
        self.diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.diagnostics.dedup();
        self.files_analyzed.sort();
        self.files_analyzed.dedup();
        self.failed_files.sort();
        self.failed_files.dedup();
    }

    /// Check if there are any error-severity diagnostics.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Get count of diagnostics by severity.
    pub fn count_by_severity(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Exit code for the run.
    ///
    /// Returns 2 if any file could not be evaluated, 1 if a diagnostic
    /// reaches the `fail_on` threshold, 0 otherwise.
    pub fn exit_code(&self, fail_on: FailOn) -> i32 {
        if !self.failed_files.is_empty() {
            2
        } else if self.diagnostics.iter().any(|d| fail_on.fails(d.severity)) {
            1
        } else {
            0
        }
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        let counts = self.count_by_severity();
        let errors = counts.get(&Severity::Error).copied().unwrap_or(0);
        let warnings = counts.get(&Severity::Warning).copied().unwrap_or(0);
        let infos = counts.get(&Severity::Info).copied().unwrap_or(0);

        let mut summary = format!(
            "Analyzed {} file(s), {} play(s), {} task(s): {} error(s), {} warning(s), {} info",
            self.files_analyzed.len(),
            self.plays_analyzed,
            self.tasks_analyzed,
            errors,
            warnings,
            infos
        );
        if !self.failed_files.is_empty() {
            summary.push_str(&format!(", {} file(s) failed", self.failed_files.len()));
        }
        summary
    }

    /// Diagnostics as `path:line:column: [ruleId] message` lines.
    pub fn render_lines(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    /// Diagnostics as one JSON object per line.
    pub fn to_json_lines(&self) -> serde_json::Result<Vec<String>> {
        self.diagnostics
            .iter()
            .map(|d| {
                serde_json::to_string(&JsonDiagnostic {
                    file: d.location.file.display().to_string(),
                    line: d.location.line,
                    column: d.location.column,
                    rule_id: &d.rule_id,
                    severity: d.severity,
                    category: d.category.to_string(),
                    message: &d.message,
                    suggestion: d.suggestion.as_deref(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::types::{Location, Position, RuleCategory};
    use pretty_assertions::assert_eq;

    fn diag(file: &str, line: usize, column: usize, rule: &str, severity: Severity) -> Diagnostic {
        Diagnostic::new(
            rule,
            severity,
            RuleCategory::Spacing,
            format!("{} violated", rule),
            Location::at(file, Position::new(line, column)),
        )
    }

    #[test]
    fn test_finalize_orders_and_dedups() {
        let mut result = LintResult::new();
        result.add_diagnostics(vec![
            diag("b.yml", 1, 1, "key-spacing", Severity::Error),
            diag("a.yml", 3, 5, "quote-style", Severity::Error),
            diag("a.yml", 3, 5, "jinja-spacing", Severity::Warning),
            diag("a.yml", 1, 9, "key-spacing", Severity::Error),
            diag("a.yml", 3, 5, "quote-style", Severity::Error),
        ]);
        result.finalize();

        assert_eq!(
            result.render_lines(),
            vec![
                "a.yml:1:9: [key-spacing] key-spacing violated",
                "a.yml:3:5: [jinja-spacing] jinja-spacing violated",
                "a.yml:3:5: [quote-style] quote-style violated",
                "b.yml:1:1: [key-spacing] key-spacing violated",
            ]
        );
    }

    #[test]
    fn test_exit_codes() {
        let mut result = LintResult::new();
        assert_eq!(result.exit_code(FailOn::Error), 0);

        result.add_diagnostics(vec![diag("a.yml", 1, 1, "jinja-spacing", Severity::Warning)]);
        assert_eq!(result.exit_code(FailOn::Error), 0);
        assert_eq!(result.exit_code(FailOn::Warning), 1);

        result.add_diagnostics(vec![diag("a.yml", 2, 1, "quote-style", Severity::Error)]);
        assert!(result.has_errors());
        assert_eq!(result.exit_code(FailOn::Error), 1);
        assert_eq!(result.exit_code(FailOn::None), 0);

        let err = LintError::Parse {
            path: PathBuf::from("bad.yml"),
            message: "bad indentation".to_string(),
            line: Some(2),
            column: Some(3),
        };
        result.merge(LintResult::failed(Path::new("bad.yml"), &err));
        assert_eq!(result.exit_code(FailOn::None), 2);
        assert!(result.summary().contains("1 file(s) failed"));
    }

    #[test]
    fn test_json_lines() {
        let mut result = LintResult::new();
        result.add_diagnostics(vec![diag("a.yml", 4, 15, "quote-style", Severity::Error)
            .with_suggestion("\"s1m0ne\"")]);
        let lines = result.to_json_lines().unwrap();
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["file"], "a.yml");
        assert_eq!(value["line"], 4);
        assert_eq!(value["rule_id"], "quote-style");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["suggestion"], "\"s1m0ne\"");
    }
}
