//! Configuration module for Playstyle
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/playstyle/playstyle.toml)
//! - User configuration (~/.config/playstyle/playstyle.toml)
//! - Project configuration (./playstyle.toml, ./.playstyle.toml)
//! - Environment variables
//! - Command-line arguments (applied by the CLI)

use crate::lint::{ExtensionPolicy, FailOn, LintConfig, Severity};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule selection and evaluation settings
    pub lint: LintConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Colors configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colors
    pub enabled: bool,

    /// Error color
    pub error: String,

    /// Warning color
    pub warning: String,

    /// Info color
    pub info: String,

    /// Location prefix color
    pub location: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            error: "red".to_string(),
            warning: "yellow".to_string(),
            info: "blue".to_string(),
            location: "bright_white".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter used when neither `-v` nor `RUST_LOG` is given
    pub level: Option<String>,

    /// Log format
    pub format: LogFormat,
}

/// Parse a human-readable duration such as `5s` or `1m 30s`.
pub fn parse_duration(text: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(text.trim())
        .with_context(|| format!("Invalid duration '{}'", text))
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
        }

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
            return paths;
        }

        // System-wide config
        paths.push(PathBuf::from("/etc/playstyle/playstyle.toml"));

        // User config
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("playstyle/playstyle.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("playstyle.toml"));
        paths.push(PathBuf::from(".playstyle.toml"));

        // Environment variable
        if let Ok(env_config) = std::env::var("PLAYSTYLE_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => {
                // Try TOML first, then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one
    fn merge(&self, other: Config) -> Config {
        // Other takes precedence for non-default values
        let defaults = LintConfig::default();
        let lint = LintConfig {
            skip_rules: extend(&self.lint.skip_rules, other.lint.skip_rules),
            only_rules: if other.lint.only_rules.is_empty() {
                self.lint.only_rules.clone()
            } else {
                other.lint.only_rules
            },
            skip_categories: extend(&self.lint.skip_categories, other.lint.skip_categories),
            severity_overrides: {
                let mut overrides = self.lint.severity_overrides.clone();
                overrides.extend(other.lint.severity_overrides);
                overrides
            },
            min_severity: if other.lint.min_severity != defaults.min_severity {
                other.lint.min_severity
            } else {
                self.lint.min_severity
            },
            extensions: if other.lint.extensions != defaults.extensions {
                other.lint.extensions
            } else {
                self.lint.extensions
            },
            fail_on: if other.lint.fail_on != defaults.fail_on {
                other.lint.fail_on
            } else {
                self.lint.fail_on
            },
            timeout: other.lint.timeout.or(self.lint.timeout),
            exclude_paths: extend(&self.lint.exclude_paths, other.lint.exclude_paths),
            vault_markers: if other.lint.vault_markers != defaults.vault_markers {
                other.lint.vault_markers
            } else {
                self.lint.vault_markers.clone()
            },
        };

        Config {
            lint,
            colors: other.colors,
            logging: LoggingConfig {
                level: other.logging.level.or_else(|| self.logging.level.clone()),
                format: other.logging.format,
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // PLAYSTYLE_FAIL_ON
        if let Ok(level) = std::env::var("PLAYSTYLE_FAIL_ON") {
            self.lint.fail_on = level
                .parse::<FailOn>()
                .context("Invalid PLAYSTYLE_FAIL_ON")?;
        }

        // PLAYSTYLE_EXTENSIONS
        if let Ok(policy) = std::env::var("PLAYSTYLE_EXTENSIONS") {
            self.lint.extensions = policy
                .parse::<ExtensionPolicy>()
                .context("Invalid PLAYSTYLE_EXTENSIONS")?;
        }

        // PLAYSTYLE_TIMEOUT
        if let Ok(timeout) = std::env::var("PLAYSTYLE_TIMEOUT") {
            self.lint.timeout = Some(parse_duration(&timeout).context("Invalid PLAYSTYLE_TIMEOUT")?);
        }

        // PLAYSTYLE_MIN_SEVERITY
        if let Ok(severity) = std::env::var("PLAYSTYLE_MIN_SEVERITY") {
            self.lint.min_severity = severity
                .parse::<Severity>()
                .context("Invalid PLAYSTYLE_MIN_SEVERITY")?;
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() || std::env::var("PLAYSTYLE_NO_COLOR").is_ok() {
            self.colors.enabled = false;
        }

        Ok(())
    }
}

fn extend<T: Clone + PartialEq>(base: &[T], other: Vec<T>) -> Vec<T> {
    let mut merged = base.to_vec();
    for item in other {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::RuleCategory;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lint.fail_on, FailOn::Error);
        assert_eq!(config.lint.extensions, ExtensionPolicy::YmlOnly);
        assert!(config.colors.enabled);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_config_merge() {
        let base = Config {
            lint: LintConfig {
                skip_rules: vec!["jinja-spacing".to_string()],
                timeout: Some(Duration::from_secs(5)),
                ..Default::default()
            },
            ..Default::default()
        };
        let other = Config {
            lint: LintConfig {
                skip_rules: vec!["block-spacing".to_string()],
                skip_categories: vec![RuleCategory::Naming],
                fail_on: FailOn::Warning,
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.lint.skip_rules, vec!["jinja-spacing", "block-spacing"]);
        assert_eq!(merged.lint.skip_categories, vec![RuleCategory::Naming]);
        assert_eq!(merged.lint.fail_on, FailOn::Warning);
        assert_eq!(merged.lint.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[lint]
skip_rules = ["indentation"]
extensions = "yml+yaml"
timeout = "2s"

[lint.severity_overrides]
jinja-spacing = "error"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::default().merge_from_file(file.path()).unwrap();
        assert_eq!(config.lint.skip_rules, vec!["indentation"]);
        assert_eq!(config.lint.extensions, ExtensionPolicy::YmlYaml);
        assert_eq!(config.lint.timeout, Some(Duration::from_secs(2)));
        assert_eq!(
            config.lint.severity_overrides.get("jinja-spacing"),
            Some(&Severity::Error)
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_explicit_config() {
        let path = PathBuf::from("/nonexistent/playstyle.toml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("PLAYSTYLE_FAIL_ON", "warning");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.lint.fail_on, FailOn::Warning);
        std::env::remove_var("PLAYSTYLE_FAIL_ON");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
        assert!(parse_duration("soon").is_err());
    }
}
