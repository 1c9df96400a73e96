//! The legacy rule and formatter API, and adapters onto the native one
//!
//! Legacy rules receive their options as a positional argument list and return
//! failures instead of reporting them; each failure carries the source it was
//! found in and positions already resolved to line and character. Legacy
//! formatters see all failures of a run at once.
//!
//! [`wrap_legacy_rule`] and [`wrap_legacy_formatter`] make these usable by the
//! [`Linter`](crate::engine::Linter) without translating their internals.

pub mod formatter;
pub mod prose;
pub mod rule;

pub use formatter::{wrap_legacy_formatter, LegacyFormatterAdapter};
pub use prose::ProseFormatter;
pub use rule::{wrap_legacy_rule, LegacyRuleAdapter};

use crate::ast::{SourceFile, SourceText, TextRange};
use crate::semantic::TypeChecker;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Severity as legacy consumers know it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacySeverity {
    #[default]
    Error,
    Warning,
    Off,
}

impl fmt::Display for LegacySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacySeverity::Error => write!(f, "error"),
            LegacySeverity::Warning => write!(f, "warning"),
            LegacySeverity::Off => write!(f, "off"),
        }
    }
}

/// An offset together with its zero-based line and character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyPosition {
    pub position: usize,
    pub line: usize,
    pub character: usize,
}

impl LegacyPosition {
    fn resolve(source: &SourceText, position: usize) -> Self {
        let lc = source.line_and_character(position);
        Self {
            position,
            line: lc.line,
            character: lc.character,
        }
    }
}

/// Replace `length` bytes at `start` with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyReplacement {
    pub start: usize,
    pub length: usize,
    pub text: String,
}

impl LegacyReplacement {
    pub fn new(start: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            length,
            text: text.into(),
        }
    }

    pub fn append_text(start: usize, text: impl Into<String>) -> Self {
        Self::new(start, 0, text)
    }

    pub fn delete_text(start: usize, length: usize) -> Self {
        Self::new(start, length, "")
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// A legacy fix is either one replacement or several
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyFix {
    Single(LegacyReplacement),
    Multiple(Vec<LegacyReplacement>),
}

impl LegacyFix {
    pub fn replacements(&self) -> &[LegacyReplacement] {
        match self {
            LegacyFix::Single(r) => std::slice::from_ref(r),
            LegacyFix::Multiple(rs) => rs,
        }
    }
}

/// A failure as produced and consumed by legacy code
#[derive(Debug, Clone)]
pub struct LegacyFailure {
    source: Arc<SourceText>,
    start: LegacyPosition,
    end: LegacyPosition,
    failure: String,
    rule_name: String,
    severity: LegacySeverity,
    fix: Option<LegacyFix>,
}

impl LegacyFailure {
    /// Create a failure in `source`. Positions are resolved right away;
    /// the severity starts out as [`LegacySeverity::Error`].
    pub fn new(
        source: Arc<SourceText>,
        start: usize,
        end: usize,
        failure: impl Into<String>,
        rule_name: impl Into<String>,
        fix: Option<LegacyFix>,
    ) -> Self {
        let start = LegacyPosition::resolve(&source, start);
        let end = LegacyPosition::resolve(&source, end);
        Self {
            source,
            start,
            end,
            failure: failure.into(),
            rule_name: rule_name.into(),
            severity: LegacySeverity::Error,
            fix,
        }
    }

    pub fn file_name(&self) -> &str {
        self.source.file_name()
    }

    pub fn source(&self) -> &Arc<SourceText> {
        &self.source
    }

    pub fn start_position(&self) -> LegacyPosition {
        self.start
    }

    pub fn end_position(&self) -> LegacyPosition {
        self.end
    }

    pub fn failure(&self) -> &str {
        &self.failure
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn severity(&self) -> LegacySeverity {
        self.severity
    }

    pub fn set_severity(&mut self, severity: LegacySeverity) {
        self.severity = severity;
    }

    pub fn fix(&self) -> Option<&LegacyFix> {
        self.fix.as_ref()
    }

    pub fn has_fix(&self) -> bool {
        self.fix.is_some()
    }
}

/// Options a legacy rule is constructed with
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRuleOptions {
    pub rule_arguments: Vec<Value>,
    pub rule_severity: LegacySeverity,
    pub rule_name: String,
    pub disabled_intervals: Vec<TextRange>,
}

/// Static description of a legacy rule
#[derive(Debug, Clone, Default)]
pub struct LegacyRuleMetadata {
    /// May be empty
    pub rule_name: String,
    pub requires_type_info: bool,
    /// `Some("")` marks a deprecated rule without explanation
    pub deprecation_message: Option<String>,
    pub typescript_only: bool,
}

pub trait LegacyRule {
    fn is_enabled(&self) -> bool;

    fn options(&self) -> &LegacyRuleOptions;

    fn apply(&mut self, source: &SourceFile) -> Vec<LegacyFailure>;

    /// The typed entry point, for rules that have one
    fn as_typed(&mut self) -> Option<&mut dyn LegacyTypedRule> {
        None
    }
}

pub trait LegacyTypedRule {
    fn apply_with_program(
        &mut self,
        source: &SourceFile,
        program: &dyn TypeChecker,
    ) -> Vec<LegacyFailure>;
}

pub trait LegacyRuleConstructor: Send + Sync {
    fn metadata(&self) -> &LegacyRuleMetadata;

    /// Whether constructed rules are typed rules
    fn is_typed(&self) -> bool {
        false
    }

    fn construct(&self, options: LegacyRuleOptions) -> Box<dyn LegacyRule>;
}

/// Renders all failures of a run in one go
pub trait LegacyFormatter {
    fn format(&mut self, failures: &[LegacyFailure], fixes: &[LegacyFailure]) -> String;
}

/// Turn a configured option value into a legacy argument list
pub fn arrayify(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}
