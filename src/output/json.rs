//! JSON output formatter

use super::Formatter;
use crate::ast::SourceText;
use crate::diagnostic::{FileSummary, Fix, Severity};
use serde::Serialize;

/// JSON formatter for machine-readable output.
///
/// Collects failures of all files and emits a single array on flush.
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
    failures: Vec<JsonFailure>,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

#[derive(Serialize)]
struct JsonFailure {
    file: String,
    rule: String,
    severity: Severity,
    message: String,
    start: JsonPosition,
    end: JsonPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<Fix>,
}

#[derive(Serialize)]
struct JsonPosition {
    position: usize,
    line: usize,
    character: usize,
}

impl JsonPosition {
    fn new(source: &SourceText, position: usize) -> Self {
        let lc = source.line_and_character(position);
        Self {
            position,
            line: lc.line,
            character: lc.character,
        }
    }
}

impl Formatter for JsonFormatter {
    fn format(&mut self, file_name: &str, summary: &FileSummary) -> Option<String> {
        if summary.failures.is_empty() {
            return None;
        }
        let source = SourceText::new(file_name, summary.content.as_str());
        self.failures
            .extend(summary.failures.iter().map(|f| JsonFailure {
                file: file_name.to_string(),
                rule: f.rule_name.clone(),
                severity: f.severity,
                message: f.message.clone(),
                start: JsonPosition::new(&source, f.start),
                end: JsonPosition::new(&source, f.end),
                fix: f.fix.clone(),
            }));
        None
    }

    fn flush(&mut self) -> Option<String> {
        let output = if self.pretty {
            serde_json::to_string_pretty(&self.failures)
        } else {
            serde_json::to_string(&self.failures)
        };
        Some(output.unwrap_or_default())
    }
}
