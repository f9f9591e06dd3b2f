//! Check command - lint playbooks
//!
//! This module implements the `check` subcommand: discover files, lint them
//! in parallel and print the diagnostics.

use super::{CommandContext, Runnable};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use playstyle::config::parse_duration;
use playstyle::discovery::FileDiscovery;
use playstyle::lint::{ExtensionPolicy, FailOn, LintConfig, LintRunner, Linter, Severity};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Exit code for configuration and startup failures
const EXIT_STARTUP: i32 = 2;

/// Arguments for the check command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Files, directories or glob patterns to lint
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Only run these rules
    #[arg(long, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub enable: Vec<String>,

    /// Skip these rules
    #[arg(long, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub disable: Vec<String>,

    /// Override a rule's severity (rule-id=level)
    #[arg(long, action = clap::ArgAction::Append)]
    pub severity: Vec<String>,

    /// Accepted YAML extensions (yml-only or yml+yaml)
    #[arg(long)]
    pub extensions: Option<ExtensionPolicy>,

    /// Lowest severity that fails the run (error, warning or none)
    #[arg(long)]
    pub fail_on: Option<FailOn>,

    /// Per-file evaluation budget (e.g. 5s)
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Exclude paths matching this glob pattern
    #[arg(long, action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,
}

fn parse_timeout(text: &str) -> Result<Duration, String> {
    parse_duration(text).map_err(|e| format!("{:#}", e))
}

impl CheckArgs {
    /// Apply command-line overrides on top of the file configuration
    pub fn lint_config(&self, base: &LintConfig) -> Result<LintConfig> {
        let mut config = base.clone();

        config.only_rules.extend(self.enable.iter().cloned());
        config.skip_rules.extend(self.disable.iter().cloned());
        config.exclude_paths.extend(self.exclude.iter().cloned());

        for entry in &self.severity {
            let (id, level) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid severity override '{}' (expected rule-id=level)", entry))?;
            let level: Severity = level
                .parse()
                .with_context(|| format!("Invalid severity override '{}'", entry))?;
            config.severity_overrides.insert(id.trim().to_string(), level);
        }

        if let Some(extensions) = self.extensions {
            config.extensions = extensions;
        }
        if let Some(fail_on) = self.fail_on {
            config.fail_on = fail_on;
        }
        if self.timeout.is_some() {
            config.timeout = self.timeout;
        }

        Ok(config)
    }

    /// Execute the check command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let linter = match self
            .lint_config(&ctx.config.lint)
            .and_then(|config| Linter::new(config).map_err(Into::into))
        {
            Ok(linter) => linter,
            Err(e) => {
                ctx.output.error(&format!("{:#}", e));
                return Ok(EXIT_STARTUP);
            }
        };

        let files = match FileDiscovery::new(linter.config()).and_then(|d| d.discover(&self.paths)) {
            Ok(files) => files,
            Err(e) => {
                ctx.output.error(&e.to_string());
                return Ok(EXIT_STARTUP);
            }
        };

        if files.is_empty() {
            ctx.output.warning("No playbook files found");
            return Ok(0);
        }
        ctx.output.info(&format!(
            "Linting {} file(s) with {} rule(s)",
            files.len(),
            linter.registry().len()
        ));

        let fail_on = linter.config().fail_on;
        let runner = LintRunner::new(Arc::new(linter));
        let result = runner.run(files).await;

        ctx.output
            .diagnostics(&result)
            .context("Failed to serialize diagnostics")?;
        ctx.output.flush();
        ctx.output.summary(&result);

        Ok(result.exit_code(fail_on))
    }
}

#[async_trait::async_trait]
impl Runnable for CheckArgs {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
