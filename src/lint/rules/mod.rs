//! Built-in style rules.
//!
//! Each rule is a stateless unit struct implementing [`Rule`]. The order of
//! [`builtin_rules`] is the registration order, which in turn fixes the
//! order in which rules see each node.

mod files;
mod include;
mod naming;
mod ordering;
mod quoting;
mod spacing;
mod syntax;

pub use files::{FileExtensionRule, VaultExtensionRule};
pub use include::{IncludeQuotingRule, IncludeSpacingRule};
pub use naming::{RoleNamingRule, VariableNamingRule};
pub use ordering::{HostBlockOrderRule, TaskFieldOrderRule};
pub use quoting::{BooleanLiteralRule, QuoteStyleRule};
pub use spacing::{BlockSpacingRule, IndentationRule, JinjaSpacingRule, KeySpacingRule};
pub use syntax::{MapSyntaxRule, SudoBecomeRule};

use super::registry::Rule;
use std::sync::Arc;

/// All built-in rules in registration order.
pub fn builtin_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(QuoteStyleRule),
        Arc::new(BooleanLiteralRule),
        Arc::new(KeySpacingRule),
        Arc::new(MapSyntaxRule),
        Arc::new(SudoBecomeRule),
        Arc::new(HostBlockOrderRule),
        Arc::new(TaskFieldOrderRule),
        Arc::new(IncludeQuotingRule),
        Arc::new(IncludeSpacingRule),
        Arc::new(BlockSpacingRule),
        Arc::new(IndentationRule),
        Arc::new(VariableNamingRule),
        Arc::new(RoleNamingRule),
        Arc::new(JinjaSpacingRule),
        Arc::new(FileExtensionRule),
        Arc::new(VaultExtensionRule),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::lint::builder::DocumentBuilder;
    use crate::lint::engine::Engine;
    use crate::lint::registry::RuleRegistry;
    use crate::lint::types::{Diagnostic, LintConfig};
    use std::path::Path;

    /// Run a single built-in rule over `source` linted as `path`.
    pub fn check_as(rule_id: &str, path: &str, source: &str, config: LintConfig) -> Vec<Diagnostic> {
        let registry = RuleRegistry::with_builtins().unwrap();
        let config = LintConfig {
            only_rules: vec![rule_id.to_string()],
            ..config
        };
        let document = DocumentBuilder::parse(Path::new(path), source).unwrap();
        Engine::new(&registry).evaluate(&document, &config)
    }

    /// Run a single built-in rule with the default configuration.
    pub fn check(rule_id: &str, source: &str) -> Vec<Diagnostic> {
        check_as(rule_id, "site.yml", source, LintConfig::default())
    }

    /// Lines of the diagnostics, in traversal order.
    pub fn lines(diagnostics: &[Diagnostic]) -> Vec<usize> {
        diagnostics.iter().map(|d| d.location.line).collect()
    }
}
