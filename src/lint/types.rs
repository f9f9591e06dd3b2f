//! Linter types and error definitions.
//!
//! This module defines the core types used throughout the linting system,
//! including severity levels, diagnostics, configuration and errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - style suggestion, never fails a run.
    Info,
    /// Warning - deviation from the guide that should be reviewed.
    #[default]
    Warning,
    /// Error - definite violation of the guide.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = LintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" | "hint" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(LintError::RuleConfig(format!(
                "unknown severity '{}' (expected info, warning or error)",
                other
            ))),
        }
    }
}

/// Category of lint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// File could not be read or parsed.
    Syntax,
    /// Quoting and literal forms of scalars.
    Quoting,
    /// Whitespace, indentation and blank lines.
    Spacing,
    /// Ordering of sections, fields and parameters.
    Ordering,
    /// Identifier and filename conventions.
    Naming,
    /// Deprecated constructs.
    Deprecation,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::Syntax => write!(f, "syntax"),
            RuleCategory::Quoting => write!(f, "quoting"),
            RuleCategory::Spacing => write!(f, "spacing"),
            RuleCategory::Ordering => write!(f, "ordering"),
            RuleCategory::Naming => write!(f, "naming"),
            RuleCategory::Deprecation => write!(f, "deprecation"),
        }
    }
}

/// A 1-indexed position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position used for findings that concern a whole file.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Location information for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Path to the file.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Location {
    /// Create a location pointing at the start of a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: path.into(),
            line: 1,
            column: 1,
        }
    }

    /// Create a location at a position within a file.
    pub fn at(path: impl Into<PathBuf>, position: Position) -> Self {
        Self {
            file: path.into(),
            line: position.line,
            column: position.column,
        }
    }

    /// Add line number.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Add column number.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    /// Format as a location string.
    pub fn to_location_string(&self) -> String {
        format!("{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_location_string())
    }
}

/// A single rule violation found during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable rule identifier (e.g., "quote-style").
    pub rule_id: String,
    /// Severity level after configuration overrides.
    pub severity: Severity,
    /// Category of the rule.
    pub category: RuleCategory,
    /// Description of the violation.
    pub message: String,
    /// Location where the violation was found.
    pub location: Location,
    /// Suggested fix or improvement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        category: RuleCategory,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            category,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    /// Add a suggestion for fixing the violation.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Check if this is an error-severity diagnostic.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Key used by the reporter for deterministic ordering.
    pub fn sort_key(&self) -> (&Path, usize, usize, &str) {
        (
            self.location.file.as_path(),
            self.location.line,
            self.location.column,
            self.rule_id.as_str(),
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [{}] {}", self.location, self.rule_id, self.message)
    }
}

/// Error type for linter operations.
#[derive(Error, Debug)]
pub enum LintError {
    /// Error reading a file.
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// YAML parsing error.
    #[error("YAML parsing error in '{path}': {message}")]
    Parse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// Valid YAML that is not a recognizable playbook.
    #[error("Malformed playbook '{path}': {message}")]
    MalformedPlaybook {
        path: PathBuf,
        message: String,
        line: Option<usize>,
    },

    /// Two rules registered under the same identifier.
    #[error("Duplicate rule id '{0}'")]
    DuplicateRuleId(String),

    /// Configuration names a rule that does not exist.
    #[error("Unknown rule id '{0}'")]
    UnknownRule(String),

    /// Rule configuration error.
    #[error("Rule configuration error: {0}")]
    RuleConfig(String),

    /// File evaluation exceeded its budget.
    #[error("Linting '{path}' timed out after {after:?}")]
    Timeout { path: PathBuf, after: Duration },

    /// Evaluation of a file aborted unexpectedly.
    #[error("Internal error while linting '{path}': {message}")]
    Internal { path: PathBuf, message: String },
}

impl LintError {
    /// Whether this error only concerns a single file.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            LintError::FileRead { .. }
                | LintError::Parse { .. }
                | LintError::MalformedPlaybook { .. }
                | LintError::Timeout { .. }
                | LintError::Internal { .. }
        )
    }

    /// Convert a per-file error into the single diagnostic reported for it.
    pub fn to_diagnostic(&self, path: &Path) -> Diagnostic {
        let (rule_id, line, column) = match self {
            LintError::FileRead { .. } => ("read-error", None, None),
            LintError::Parse { line, column, .. } => ("parse-error", *line, *column),
            LintError::MalformedPlaybook { line, .. } => ("malformed-playbook", *line, None),
            LintError::Timeout { .. } => ("timeout", None, None),
            LintError::Internal { .. } => ("internal-error", None, None),
            _ => ("configuration", None, None),
        };
        let message = match self {
            LintError::FileRead { message, .. }
            | LintError::Parse { message, .. }
            | LintError::MalformedPlaybook { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Diagnostic::new(
            rule_id,
            Severity::Error,
            RuleCategory::Syntax,
            message,
            Location::file(path)
                .with_line(line.unwrap_or(1))
                .with_column(column.unwrap_or(1)),
        )
    }
}

/// Result type for linter operations.
pub type LintOpResult<T> = Result<T, LintError>;

/// Which file extensions count as canonical for YAML files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionPolicy {
    /// Only `.yml` is accepted.
    #[default]
    YmlOnly,
    /// Both `.yml` and `.yaml` are accepted.
    #[serde(alias = "yml+yaml")]
    YmlYaml,
}

impl ExtensionPolicy {
    /// Extensions accepted for YAML files.
    pub fn allowed(&self) -> &'static [&'static str] {
        match self {
            ExtensionPolicy::YmlOnly => &["yml"],
            ExtensionPolicy::YmlYaml => &["yml", "yaml"],
        }
    }

    /// Check whether a path has an accepted extension.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.allowed().contains(&e))
    }
}

impl std::str::FromStr for ExtensionPolicy {
    type Err = LintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yml" | "yml-only" => Ok(ExtensionPolicy::YmlOnly),
            "yml+yaml" | "yml-yaml" | "yaml" => Ok(ExtensionPolicy::YmlYaml),
            other => Err(LintError::RuleConfig(format!(
                "unknown extension policy '{}' (expected yml-only or yml+yaml)",
                other
            ))),
        }
    }
}

/// Lowest severity that makes a run fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    /// Fail on error-severity diagnostics.
    #[default]
    Error,
    /// Fail on warnings and errors.
    Warning,
    /// Never fail because of diagnostics.
    None,
}

impl FailOn {
    /// Check whether a diagnostic of this severity fails the run.
    pub fn fails(&self, severity: Severity) -> bool {
        match self {
            FailOn::Error => severity >= Severity::Error,
            FailOn::Warning => severity >= Severity::Warning,
            FailOn::None => false,
        }
    }
}

impl std::str::FromStr for FailOn {
    type Err = LintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(FailOn::Error),
            "warning" => Ok(FailOn::Warning),
            "none" => Ok(FailOn::None),
            other => Err(LintError::RuleConfig(format!(
                "unknown fail-on level '{}' (expected error, warning or none)",
                other
            ))),
        }
    }
}

/// Configuration for the linter.
///
/// Built once before evaluation starts and only ever passed by reference,
/// so several configurations can be evaluated side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Rules to skip (by rule ID).
    pub skip_rules: Vec<String>,
    /// Only run these rules (by rule ID). Empty means run all.
    pub only_rules: Vec<String>,
    /// Categories to skip.
    pub skip_categories: Vec<RuleCategory>,
    /// Severity overrides keyed by rule ID.
    pub severity_overrides: IndexMap<String, Severity>,
    /// Minimum severity to report.
    pub min_severity: Severity,
    /// Accepted YAML file extensions.
    pub extensions: ExtensionPolicy,
    /// Lowest severity that fails the run.
    pub fail_on: FailOn,
    /// Per-file evaluation budget.
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Paths to exclude from discovery.
    pub exclude_paths: Vec<String>,
    /// Filename fragments that mark a referenced file as vault-encrypted.
    pub vault_markers: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            skip_rules: Vec::new(),
            only_rules: Vec::new(),
            skip_categories: Vec::new(),
            severity_overrides: IndexMap::new(),
            min_severity: Severity::Info,
            extensions: ExtensionPolicy::default(),
            fail_on: FailOn::default(),
            timeout: None,
            exclude_paths: Vec::new(),
            vault_markers: vec!["vault".to_string()],
        }
    }
}

impl LintConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a rule should be run.
    pub fn should_run_rule(&self, rule_id: &str, category: RuleCategory) -> bool {
        if self.skip_rules.iter().any(|r| r == rule_id) {
            return false;
        }

        if !self.only_rules.is_empty() && !self.only_rules.iter().any(|r| r == rule_id) {
            return false;
        }

        !self.skip_categories.contains(&category)
    }

    /// Resolve the effective severity of a rule.
    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        self.severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(default)
    }

    /// Check whether a diagnostic of this severity is reported at all.
    pub fn reports(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    /// All rule ids referenced by this configuration.
    pub fn referenced_rules(&self) -> impl Iterator<Item = &str> {
        self.skip_rules
            .iter()
            .chain(self.only_rules.iter())
            .chain(self.severity_overrides.keys())
            .map(String::as_str)
    }

    /// Create a relaxed configuration that only reports errors.
    pub fn relaxed() -> Self {
        Self {
            min_severity: Severity::Error,
            ..Default::default()
        }
    }
}
