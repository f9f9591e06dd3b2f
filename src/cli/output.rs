//! Output formatting module for Playstyle
//!
//! Diagnostics go to stdout, either as colored `path:line:column: [rule] message`
//! lines or as JSON lines. Summaries and messages go to stderr.

use colored::{Color, Colorize};
use playstyle::config::ColorsConfig;
use playstyle::lint::{Diagnostic, LintResult, Severity};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
    /// Configured colors
    colors: ColorsConfig,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            json_mode,
            verbosity,
            colors: ColorsConfig::default(),
            start_time: Instant::now(),
        }
    }

    /// Use configured colors instead of the defaults
    pub fn with_colors(mut self, colors: ColorsConfig) -> Self {
        self.colors = colors;
        self
    }

    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    fn severity_color(&self, severity: Severity) -> Color {
        let name = match severity {
            Severity::Error => &self.colors.error,
            Severity::Warning => &self.colors.warning,
            Severity::Info => &self.colors.info,
        };
        parse_color(name, Color::White)
    }

    /// Format one diagnostic line
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        if !self.use_color {
            return diagnostic.to_string();
        }

        let location = diagnostic
            .location
            .to_string()
            .color(parse_color(&self.colors.location, Color::BrightWhite))
            .bold();
        let rule = format!("[{}]", diagnostic.rule_id).color(self.severity_color(diagnostic.severity));
        format!("{}: {} {}", location, rule, diagnostic.message)
    }

    /// Print every diagnostic of a result
    pub fn diagnostics(&self, result: &LintResult) -> serde_json::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        if self.json_mode {
            for line in result.to_json_lines()? {
                let _ = writeln!(out, "{}", line);
            }
            return Ok(());
        }

        for diagnostic in &result.diagnostics {
            let _ = writeln!(out, "{}", self.format_diagnostic(diagnostic));
            if self.verbosity >= 1 {
                if let Some(suggestion) = &diagnostic.suggestion {
                    if self.use_color {
                        let _ = writeln!(out, "    {} {}", "help:".cyan(), suggestion);
                    } else {
                        let _ = writeln!(out, "    help: {}", suggestion);
                    }
                }
            }
        }
        Ok(())
    }

    /// Print the run summary
    pub fn summary(&self, result: &LintResult) {
        if self.json_mode {
            let counts = result.count_by_severity();
            let summary = serde_json::json!({
                "type": "summary",
                "files": result.files_analyzed.len(),
                "failed_files": result.failed_files.len(),
                "errors": counts.get(&Severity::Error).copied().unwrap_or(0),
                "warnings": counts.get(&Severity::Warning).copied().unwrap_or(0),
                "info": counts.get(&Severity::Info).copied().unwrap_or(0),
            });
            eprintln!("{}", serde_json::to_string(&summary).unwrap_or_default());
            return;
        }

        let elapsed = format_duration(self.start_time.elapsed());
        let line = format!("{} in {}", result.summary(), elapsed);
        if !self.use_color {
            eprintln!("{}", line);
        } else if result.has_errors() || !result.failed_files.is_empty() {
            eprintln!("{}", line.red().bold());
        } else if result.diagnostics.is_empty() {
            eprintln!("{}", line.green().bold());
        } else {
            eprintln!("{}", line.yellow().bold());
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", serde_json::to_string(&warn).unwrap_or_default());
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        // Print header
        let mut header_line = String::new();
        for (i, h) in headers.iter().enumerate() {
            if i > 0 {
                header_line.push_str("  ");
            }
            header_line.push_str(&format!("{:width$}", h, width = widths[i]));
        }

        if self.use_color {
            println!("{}", header_line.trim_end().bright_white().bold());
        } else {
            println!("{}", header_line.trim_end());
        }

        // Print rows
        for row in rows {
            let mut row_line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    row_line.push_str("  ");
                }
                if i < widths.len() {
                    row_line.push_str(&format!("{:width$}", cell, width = widths[i]));
                }
            }
            println!("{}", row_line.trim_end());
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

fn parse_color(name: &str, fallback: Color) -> Color {
    name.parse().unwrap_or(fallback)
}

/// Format a duration as a human-readable string
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
