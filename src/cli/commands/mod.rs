//! Subcommands module for Playstyle CLI
//!
//! This module contains all the subcommand implementations.

pub mod check;
pub mod rules;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use is_terminal::IsTerminal;
use playstyle::config::Config;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.colors.enabled && std::io::stdout().is_terminal();
        let output = OutputFormatter::new(use_color, cli.is_json(), cli.verbosity())
            .with_colors(config.colors.clone());

        Self { config, output }
    }
}

/// Trait for runnable commands
#[async_trait::async_trait]
pub trait Runnable {
    /// Execute the command
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32>;
}
