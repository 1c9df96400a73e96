//! Human-readable output grouped by file

use super::Formatter;
use crate::ast::SourceText;
use crate::diagnostic::{FileSummary, Severity};
use colored::*;

/// Stylish formatter with optional color support
pub struct StylishFormatter {
    /// Enable colored output
    pub colored: bool,

    errors: usize,
    warnings: usize,
    suggestions: usize,
    fixed: usize,
}

impl Default for StylishFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            errors: 0,
            warnings: 0,
            suggestions: 0,
            fixed: 0,
        }
    }
}

impl StylishFormatter {
    /// Create a new stylish formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = format!("{}", severity);
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red(),
            Severity::Warning => s.yellow(),
            Severity::Suggestion => s.blue(),
        }
    }

    fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Suggestion => self.suggestions += 1,
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

impl Formatter for StylishFormatter {
    fn format(&mut self, file_name: &str, summary: &FileSummary) -> Option<String> {
        self.fixed += summary.fixes;
        if summary.failures.is_empty() {
            return None;
        }

        let source = SourceText::new(file_name, summary.content.as_str());
        let mut output = if self.colored {
            file_name.underline().to_string()
        } else {
            file_name.to_string()
        };
        output.push('\n');

        for failure in &summary.failures {
            self.count(failure.severity);
            let lc = source.line_and_character(failure.start);
            let position = format!("{}:{}", lc.line + 1, lc.character + 1);
            let rule = if self.colored {
                failure.rule_name.dimmed().to_string()
            } else {
                failure.rule_name.clone()
            };
            output.push_str(&format!(
                "  {:<8} {:<10} {}  {}\n",
                position,
                self.severity_str(failure.severity),
                failure.message,
                rule
            ));
        }
        Some(output)
    }

    fn flush(&mut self) -> Option<String> {
        let total = self.errors + self.warnings + self.suggestions;
        if total == 0 && self.fixed == 0 {
            return None;
        }
        let line = format!(
            "{} ({}, {}, {}), {} fixed",
            plural(total, "problem"),
            plural(self.errors, "error"),
            plural(self.warnings, "warning"),
            plural(self.suggestions, "suggestion"),
            self.fixed
        );
        Some(if self.colored && self.errors > 0 {
            line.red().bold().to_string()
        } else {
            line
        })
    }
}
