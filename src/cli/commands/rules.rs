//! Rules command - list the registered rules

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use playstyle::lint::RuleRegistry;

/// Arguments for the rules command
#[derive(Parser, Debug, Clone)]
pub struct RulesArgs {
    /// Only list rules of this category
    #[arg(long)]
    pub category: Option<String>,
}

impl RulesArgs {
    /// Execute the rules command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let registry = RuleRegistry::with_builtins()?;
        let config = &ctx.config.lint;

        let rules: Vec<_> = registry
            .rules()
            .filter(|rule| {
                self.category
                    .as_deref()
                    .map_or(true, |c| rule.category().to_string() == c.to_ascii_lowercase())
            })
            .collect();

        if ctx.output.is_json() {
            for rule in rules {
                let line = serde_json::json!({
                    "id": rule.id(),
                    "category": rule.category().to_string(),
                    "severity": config.severity_for(rule.id(), rule.default_severity()),
                    "enabled": config.should_run_rule(rule.id(), rule.category()),
                    "description": rule.description(),
                });
                println!("{}", serde_json::to_string(&line)?);
            }
            return Ok(0);
        }

        let rows: Vec<Vec<String>> = rules
            .iter()
            .map(|rule| {
                let mut severity = config
                    .severity_for(rule.id(), rule.default_severity())
                    .to_string();
                if !config.should_run_rule(rule.id(), rule.category()) {
                    severity.push_str(" (off)");
                }
                vec![
                    rule.id().to_string(),
                    rule.category().to_string(),
                    severity,
                    rule.description().to_string(),
                ]
            })
            .collect();

        ctx.output
            .table(&["RULE", "CATEGORY", "SEVERITY", "DESCRIPTION"], &rows);
        Ok(0)
    }
}

#[async_trait::async_trait]
impl Runnable for RulesArgs {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_args_parsing() {
        let args = RulesArgs::try_parse_from(["rules", "--category", "spacing"]).unwrap();
        assert_eq!(args.category.as_deref(), Some("spacing"));
    }
}
