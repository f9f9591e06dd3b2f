//! Playbook style linting.
//!
//! This module checks Ansible playbooks against a fixed style convention:
//!
//! - Quoting of strings, booleans and include targets
//! - Key, block, include and Jinja spacing
//! - Ordering of host block sections and task fields
//! - Variable, role and file naming
//! - Deprecated privilege escalation directives
//!
//! A file is parsed into a typed [`PlaybookDocument`] by the
//! [`DocumentBuilder`], walked by the [`Engine`], and every registered
//! [`Rule`] subscribed to a node's kind reports [`Diagnostic`]s for it.
//!
//! # Example
//!
//! ```rust,ignore
//! use playstyle::lint::{LintConfig, Linter};
//!
//! let linter = Linter::new(LintConfig::default())?;
//! let result = linter.lint_path(Path::new("site.yml"));
//!
//! for line in result.render_lines() {
//!     println!("{}", line);
//! }
//! ```

mod builder;
mod engine;
mod model;
mod registry;
mod report;
pub mod rules;
mod runner;
mod source;
mod types;

pub use builder::DocumentBuilder;
pub use engine::Engine;
pub use model::{
    Block, Entry, HostBlock, HostField, HostFieldKind, HostSection, IncludeStatement,
    ModuleInvocation, PlaybookDocument, RoleRef, RoleSyntax, Scalar, ScalarContext, SectionItems,
    Task, TaskBlock, TaskField, TaskFieldKind, TaskItem, Value, ValueKind,
};
pub use registry::{Node, NodeKind, Rule, RuleContext, RuleRegistry};
pub use report::LintResult;
pub use runner::LintRunner;
pub use source::{KeySpacing, QuoteStyle, SourceMap};
pub use types::{
    Diagnostic, ExtensionPolicy, FailOn, LintConfig, LintError, LintOpResult, Location, Position,
    RuleCategory, Severity,
};

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Header line of an Ansible Vault encrypted file.
const VAULT_HEADER: &str = "$ANSIBLE_VAULT;";

/// Lints playbooks with a fixed registry and configuration.
#[derive(Debug, Clone)]
pub struct Linter {
    config: LintConfig,
    registry: Arc<RuleRegistry>,
}

impl Linter {
    /// Create a linter with all built-in rules.
    pub fn new(config: LintConfig) -> LintOpResult<Self> {
        Self::with_registry(config, Arc::new(RuleRegistry::with_builtins()?))
    }

    /// Create a linter with a custom registry.
    ///
    /// Fails if the configuration references a rule the registry lacks.
    pub fn with_registry(config: LintConfig, registry: Arc<RuleRegistry>) -> LintOpResult<Self> {
        if let Some(unknown) = config.referenced_rules().find(|id| !registry.contains(id)) {
            return Err(LintError::UnknownRule(unknown.to_string()));
        }
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Build the document model for a file's content.
    pub fn parse(&self, content: &str, path: &Path) -> LintOpResult<PlaybookDocument> {
        if is_vault_encrypted(content) {
            debug!(path = %path.display(), "Skipping parse of vault-encrypted file");
            return Ok(PlaybookDocument::encrypted(path));
        }
        DocumentBuilder::parse(path, content)
    }

    /// Lint content, propagating per-file errors.
    pub fn check_content(&self, content: &str, path: &Path) -> LintOpResult<LintResult> {
        let document = self.parse(content, path)?;
        let diagnostics = Engine::new(&self.registry).evaluate(&document, &self.config);

        let mut result = LintResult::new();
        result.files_analyzed.push(path.to_path_buf());
        result.plays_analyzed = document.play_count();
        result.tasks_analyzed = document.task_count();
        result.add_diagnostics(diagnostics);
        result.finalize();
        Ok(result)
    }

    /// Lint content, turning per-file errors into a diagnostic.
    pub fn lint_content(&self, content: &str, path: &Path) -> LintResult {
        self.check_content(content, path)
            .unwrap_or_else(|e| LintResult::failed(path, &e))
    }

    /// Read and lint a file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn lint_path(&self, path: &Path) -> LintResult {
        match std::fs::read_to_string(path) {
            Ok(content) => self.lint_content(&content, path),
            Err(e) => {
                let err = LintError::FileRead {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                };
                LintResult::failed(path, &err)
            }
        }
    }
}

/// Check whether content is an Ansible Vault payload.
pub fn is_vault_encrypted(content: &str) -> bool {
    content.trim_start().starts_with(VAULT_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_rule_in_config() {
        let config = LintConfig {
            skip_rules: vec!["no-such-rule".to_string()],
            ..Default::default()
        };
        let err = Linter::new(config).unwrap_err();
        assert!(matches!(err, LintError::UnknownRule(id) if id == "no-such-rule"));
    }

    #[test]
    fn test_malformed_is_single_diagnostic() {
        let linter = Linter::new(LintConfig::default()).unwrap();
        let result = linter.lint_content("hosts: all\n", Path::new("site.yml"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].rule_id, "malformed-playbook");
        assert_eq!(result.failed_files.len(), 1);
    }

    #[test]
    fn test_vault_file_not_parsed() {
        let linter = Linter::new(LintConfig::default()).unwrap();
        let content = "$ANSIBLE_VAULT;1.1;AES256\n6136623533383565\n";
        let result = linter.lint_content(content, Path::new("secrets.yml"));
        assert!(result.failed_files.is_empty());
        let rules: Vec<_> = result.diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
        assert_eq!(rules, vec!["vault-extension"]);

        let result = linter.lint_content(content, Path::new("secrets.vault"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_severity_override_applies() {
        let mut config = LintConfig::default();
        config
            .severity_overrides
            .insert("quote-style".to_string(), Severity::Info);
        let linter = Linter::new(config).unwrap();
        let result = linter.lint_content(
            "- hosts: all\n  tasks:\n    - name: \"svc\"\n      service:\n        name: s1m0ne\n",
            Path::new("site.yml"),
        );
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Info);
        assert!(!result.has_errors());
    }
}
