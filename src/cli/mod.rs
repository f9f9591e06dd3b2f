//! CLI module for Playstyle
//!
//! This module provides the command-line interface for Playstyle,
//! including argument parsing, configuration loading, and subcommand handling.

pub mod commands;
pub mod completions;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Playstyle - A style linter for Ansible playbooks
///
/// Checks playbooks against a fixed formatting and naming convention.
#[derive(Parser, Debug, Clone)]
#[command(name = "playstyle")]
#[command(author = "Playstyle Contributors")]
#[command(version)]
#[command(about = "A style-conformance linter for Ansible playbooks", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "PLAYSTYLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// One JSON object per diagnostic per line
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Lint playbooks
    Check(commands::check::CheckArgs),

    /// List the registered rules
    Rules(commands::rules::RulesArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["playstyle", "check", "site.yml"]).unwrap();
        assert!(matches!(cli.command, Commands::Check(_)));
        assert!(!cli.is_json());
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["playstyle", "-vvvv", "rules"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "playstyle",
            "check",
            "--output",
            "json",
            "--no-color",
            "-c",
            "lint.toml",
        ])
        .unwrap();
        assert!(cli.is_json());
        assert!(cli.no_color);
        assert_eq!(cli.config, Some(PathBuf::from("lint.toml")));
    }

    #[test]
    fn test_unknown_output_format() {
        assert!(Cli::try_parse_from(["playstyle", "--output", "yaml", "rules"]).is_err());
    }
}
