//! Shell completions module for Playstyle
//!
//! Provides shell completion scripts for bash, zsh, fish, powershell, and elvish.

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

/// Arguments for the completions command
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Print installation instructions instead of the script
    #[arg(long)]
    pub instructions: bool,
}

impl CompletionsArgs {
    pub fn execute(&self) -> i32 {
        if self.instructions {
            print_installation_instructions(self.shell);
        } else {
            generate_completions(self.shell, &mut io::stdout());
        }
        0
    }
}

/// Generate shell completions into `out`
pub fn generate_completions(shell: Shell, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "playstyle", out);
}

/// Print installation instructions for completions
pub fn print_installation_instructions(shell: Shell) {
    match shell {
        Shell::Bash => {
            println!("# Bash completion installation:");
            println!("# Add the following to your ~/.bashrc:");
            println!("eval \"$(playstyle completions bash)\"");
            println!();
            println!("# Or save to file:");
            println!(
                "playstyle completions bash > ~/.local/share/bash-completion/completions/playstyle"
            );
        }
        Shell::Zsh => {
            println!("# Zsh completion installation:");
            println!("mkdir -p ~/.zsh/completions");
            println!("echo 'fpath=(~/.zsh/completions $fpath)' >> ~/.zshrc");
            println!("playstyle completions zsh > ~/.zsh/completions/_playstyle");
        }
        Shell::Fish => {
            println!("# Fish completion installation:");
            println!("playstyle completions fish > ~/.config/fish/completions/playstyle.fish");
        }
        Shell::PowerShell => {
            println!("# PowerShell completion installation:");
            println!("# Add the following to your PowerShell profile:");
            println!("Invoke-Expression (& playstyle completions powershell | Out-String)");
        }
        Shell::Elvish => {
            println!("# Elvish completion installation:");
            println!("# Add the following to ~/.elvish/rc.elv:");
            println!("eval (playstyle completions elvish | slurp)");
        }
        _ => {
            println!("# Unknown shell. Please refer to your shell's documentation for completion installation.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completions(shell: Shell) -> String {
        let mut buf = Vec::new();
        generate_completions(shell, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_completions() {
        let completions = completions(Shell::Bash);
        assert!(completions.contains("playstyle"));
        assert!(completions.contains("complete"));
    }

    #[test]
    fn test_zsh_completions() {
        let completions = completions(Shell::Zsh);
        assert!(completions.contains("playstyle"));
        assert!(completions.contains("compdef") || completions.contains("_playstyle"));
    }

    #[test]
    fn test_completions_include_subcommands() {
        let completions = completions(Shell::Fish);
        assert!(completions.contains("check"));
        assert!(completions.contains("rules"));
    }
}
