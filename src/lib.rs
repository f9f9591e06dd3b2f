//! # Playstyle - A Style Linter for Ansible Playbooks
//!
//! Playstyle checks Ansible playbooks against a fixed formatting and naming
//! convention and reports every deviation as a diagnostic with a precise
//! source location.
//!
//! ## Core Concepts
//!
//! - **Document model**: a typed view of a playbook (host blocks, tasks,
//!   module invocations, roles, include statements) that keeps the
//!   formatting a generic YAML parser throws away
//! - **Rules**: independent, side-effect-free checks subscribed to node kinds
//! - **Registry**: the ordered set of rules, built once per run
//! - **Engine**: walks a document and dispatches every applicable rule
//! - **Reporter**: sorts, deduplicates and summarizes diagnostics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CLI Interface                          │
//! │          (clap parsing, config layering, discovery)           │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Lint Runner                           │
//! │         (one blocking tokio task per file, timeouts)          │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//! ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │ Document Model  │   │  Rule Registry  │   │    Reporter     │
//! │    Builder      │──▶│    + Engine     │──▶│ (sort, dedup,   │
//! │ (serde_yaml +   │   │                 │   │  exit code)     │
//! │  outline scan)  │   │                 │   │                 │
//! └─────────────────┘   └─────────────────┘   └─────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use playstyle::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LintConfig::default();
//!     let files = FileDiscovery::new(&config)?.discover(&["playbooks"])?;
//!
//!     let runner = LintRunner::new(Arc::new(Linter::new(config)?));
//!     let result = runner.run(files).await;
//!
//!     for line in result.render_lines() {
//!         println!("{}", line);
//!     }
//!     std::process::exit(result.exit_code(FailOn::Error));
//! }
//! ```

#![warn(clippy::all)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::discovery::FileDiscovery;
    pub use crate::lint::{
        Diagnostic, ExtensionPolicy, FailOn, LintConfig, LintError, LintOpResult, LintResult,
        LintRunner, Linter, Location, Node, NodeKind, PlaybookDocument, Rule, RuleCategory,
        RuleContext, RuleRegistry, Severity,
    };
    pub use std::sync::Arc;
}

/// Style rules, document model and evaluation engine.
pub mod lint;

/// Resolution of command-line inputs to playbook files.
pub mod discovery;

/// Layered configuration loading.
///
/// Merges system, user and project configuration files with environment
/// overrides into a single [`Config`](config::Config).
pub mod config;

/// Returns the current version of Playstyle.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
