//! Filename extension conventions.

use crate::lint::model::{Scalar, ScalarContext};
use crate::lint::registry::{Node, NodeKind, Rule, RuleContext};
use crate::lint::types::{Diagnostic, LintConfig, Position, RuleCategory, Severity};
use std::path::Path;

const VAULT_EXTENSION: &str = "vault";

fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|e| e.to_str())
}

/// Whether a filename marks its file as vault-encrypted.
fn is_vault_name(name: &str, config: &LintConfig) -> bool {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
        .to_ascii_lowercase();
    config
        .vault_markers
        .iter()
        .any(|marker| !marker.is_empty() && file_name.contains(&marker.to_ascii_lowercase()))
}

/// Referenced filename of an include target or `vars_files` entry.
fn referenced_file(node: Node<'_>) -> Option<&Scalar> {
    match node {
        Node::Scalar(scalar)
            if matches!(
                scalar.context,
                ScalarContext::IncludeTarget | ScalarContext::FileReference
            ) && !scalar.is_templated() =>
        {
            Some(scalar)
        }
        _ => None,
    }
}

/// YAML files use the canonical lowercase extension.
pub struct FileExtensionRule;

impl FileExtensionRule {
    fn check(&self, name: &str, position: Position, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(ext) = extension(name) else {
            return Vec::new();
        };
        let lowered = ext.to_ascii_lowercase();
        if lowered != "yml" && lowered != "yaml" {
            return Vec::new();
        }

        let allowed = ctx.config.extensions.allowed();
        if allowed.contains(&ext) {
            return Vec::new();
        }
        vec![ctx
            .report(
                self,
                position,
                format!("File '{}' should use the '.{}' extension", name, allowed[0]),
            )
            .with_suggestion(
                Path::new(name)
                    .with_extension(allowed[0])
                    .display()
                    .to_string(),
            )]
    }
}

impl Rule for FileExtensionRule {
    fn id(&self) -> &'static str {
        "file-extension"
    }

    fn description(&self) -> &'static str {
        "YAML files use the lowercase .yml extension"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Document, NodeKind::Scalar]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        if let Node::Document(document) = node {
            if document.encrypted {
                return Vec::new();
            }
            let name = document.path().to_string_lossy();
            return self.check(&name, Position::start(), ctx);
        }

        match referenced_file(node) {
            Some(scalar) if !is_vault_name(&scalar.text, ctx.config) => {
                self.check(&scalar.text, scalar.position, ctx)
            }
            _ => Vec::new(),
        }
    }
}

/// Vault-encrypted files use the `.vault` extension.
pub struct VaultExtensionRule;

impl VaultExtensionRule {
    fn check(&self, name: &str, position: Position, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        if extension(name) == Some(VAULT_EXTENSION) {
            return Vec::new();
        }
        vec![ctx
            .report(
                self,
                position,
                format!(
                    "Vault-encrypted file '{}' should use the '.{}' extension",
                    name, VAULT_EXTENSION
                ),
            )
            .with_suggestion(
                Path::new(name)
                    .with_extension(VAULT_EXTENSION)
                    .display()
                    .to_string(),
            )]
    }
}

impl Rule for VaultExtensionRule {
    fn id(&self) -> &'static str {
        "vault-extension"
    }

    fn description(&self) -> &'static str {
        "Vault-encrypted files use the .vault extension"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self) -> &'static [NodeKind] {
        &[NodeKind::Document, NodeKind::Scalar]
    }

    fn evaluate(&self, node: Node<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        if let Node::Document(document) = node {
            if !document.encrypted {
                return Vec::new();
            }
            let name = document.path().to_string_lossy();
            return self.check(&name, Position::start(), ctx);
        }

        match referenced_file(node) {
            Some(scalar) if is_vault_name(&scalar.text, ctx.config) => {
                self.check(&scalar.text, scalar.position, ctx)
            }
            _ => Vec::new(),
        }
    }
}
