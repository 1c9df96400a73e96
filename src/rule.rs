//! Rule contract: metadata, per-file context and the traits rules implement
//!
//! A rule is created once per file by its [`RuleConstructor`], applied once, and
//! reports failures through [`RuleContext::add_failure`]. Rules that need type
//! information implement [`TypedRule`] and are only created when the run has a
//! semantic model.

use crate::ast::{Node, SourceFile};
use crate::diagnostic::{Failure, Fix, Severity};
use crate::semantic::TypeChecker;
use serde_json::Value;
use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Violation of the rule contract
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule '{rule}' reported a failure at {start}..{end}, which is not a valid range in '{file}' ({len} bytes)")]
    FailureOutOfRange {
        rule: String,
        file: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Rule '{rule}' reported an invalid fix in '{file}': {reason}")]
    InvalidFix {
        rule: String,
        file: String,
        reason: String,
    },

    #[error("Adding failures for a different SourceFile is not supported. Expected '{expected}' but received '{received}' from rule '{rule}'.")]
    ForeignFileMismatch {
        expected: String,
        received: String,
        rule: String,
    },

    #[error("Rule '{rule}' failed: {message}")]
    Other { rule: String, message: String },
}

/// Deprecation state of a rule
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Deprecation {
    #[default]
    No,
    /// Deprecated without further explanation
    Yes,
    /// Deprecated, with a hint on what to use instead
    WithMessage(String),
}

impl Deprecation {
    pub fn is_deprecated(&self) -> bool {
        !matches!(self, Deprecation::No)
    }

    /// Get the deprecation warning message
    pub fn warning(&self, rule_name: &str) -> Option<String> {
        match self {
            Deprecation::No => None,
            Deprecation::Yes => Some(format!("Rule '{}' is deprecated.", rule_name)),
            Deprecation::WithMessage(message) => {
                Some(format!("Rule '{}' is deprecated: {}", rule_name, message))
            }
        }
    }
}

/// Predicate deciding whether a rule applies to a file
pub type SupportsFn = fn(&SourceFile) -> bool;

/// Static information about a rule, known before it is created
#[derive(Debug, Clone, Default)]
pub struct RuleMetadata {
    /// The rule can only run with a semantic model
    pub requires_type_information: bool,

    /// Restricts the files the rule runs on (`None` = all files)
    pub supports: Option<SupportsFn>,

    /// Deprecation state
    pub deprecated: Deprecation,

    /// Short description
    pub description: Option<String>,
}

impl RuleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the rule as requiring type information
    pub fn typed(mut self) -> Self {
        self.requires_type_information = true;
        self
    }

    /// Restrict the files the rule runs on
    pub fn with_supports(mut self, supports: SupportsFn) -> Self {
        self.supports = Some(supports);
        self
    }

    /// Set the deprecation state
    pub fn with_deprecation(mut self, deprecated: Deprecation) -> Self {
        self.deprecated = deprecated;
        self
    }

    /// Set the description
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Check if the rule wants to run on a file
    pub fn supports_file(&self, file: &SourceFile) -> bool {
        self.supports.is_none_or(|supports| supports(file))
    }
}

/// Everything a rule gets to see while it runs on one file
pub struct RuleContext<'a> {
    source_file: &'a SourceFile,
    program: Option<&'a dyn TypeChecker>,
    rule_name: &'a str,
    options: &'a Value,
    severity: Severity,
    failures: Vec<Failure>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        source_file: &'a SourceFile,
        rule_name: &'a str,
        options: &'a Value,
        severity: Severity,
    ) -> Self {
        Self {
            source_file,
            program: None,
            rule_name,
            options,
            severity,
            failures: Vec::new(),
        }
    }

    /// Attach the semantic model of the run
    pub fn with_program(mut self, program: Option<&'a dyn TypeChecker>) -> Self {
        self.program = program;
        self
    }

    pub fn source_file(&self) -> &'a SourceFile {
        self.source_file
    }

    pub fn program(&self) -> Option<&'a dyn TypeChecker> {
        self.program
    }

    pub fn rule_name(&self) -> &'a str {
        self.rule_name
    }

    /// Configured options, `Null` when there are none
    pub fn options(&self) -> &'a Value {
        self.options
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// All nodes of the file in pre-order
    pub fn flattened_ast(&self) -> &'a [Node] {
        self.source_file.nodes()
    }

    /// Report a failure spanning `start..end`.
    ///
    /// Positions and fix replacements must be valid ranges in the current file
    /// and the replacements must not overlap.
    pub fn add_failure(
        &mut self,
        start: usize,
        end: usize,
        message: impl Into<String>,
        fix: Option<Fix>,
    ) -> Result<(), RuleError> {
        let text = self.source_file.text();
        if !is_valid_range(text, start, end) {
            return Err(RuleError::FailureOutOfRange {
                rule: self.rule_name.to_string(),
                file: self.source_file.file_name().to_string(),
                start,
                end,
                len: text.len(),
            });
        }
        if let Some(fix) = &fix {
            self.validate_fix(fix)?;
        }
        self.failures.push(Failure {
            start,
            end,
            message: message.into(),
            rule_name: self.rule_name.to_string(),
            severity: self.severity,
            fix,
        });
        Ok(())
    }

    /// Failures reported so far
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    fn validate_fix(&self, fix: &Fix) -> Result<(), RuleError> {
        let invalid = |reason: String| RuleError::InvalidFix {
            rule: self.rule_name.to_string(),
            file: self.source_file.file_name().to_string(),
            reason,
        };
        let text = self.source_file.text();
        if let Some(r) = fix
            .replacements
            .iter()
            .find(|r| !is_valid_range(text, r.start, r.end))
        {
            return Err(invalid(format!(
                "replacement {}..{} is not a valid range",
                r.start, r.end
            )));
        }
        if let Some((a, b)) = fix.find_overlap() {
            return Err(invalid(format!(
                "replacements {}..{} and {}..{} overlap",
                a.start, a.end, b.start, b.end
            )));
        }
        Ok(())
    }
}

fn is_valid_range(text: &str, start: usize, end: usize) -> bool {
    start <= end && end <= text.len() && text.is_char_boundary(start) && text.is_char_boundary(end)
}

/// Context of a rule that requires type information.
///
/// Only exists while a semantic model is available, so [`Self::checker`]
/// never fails.
pub struct TypedRuleContext<'c, 'a> {
    base: &'c mut RuleContext<'a>,
    checker: &'a dyn TypeChecker,
}

impl<'c, 'a> TypedRuleContext<'c, 'a> {
    /// Returns `None` when the context has no semantic model
    pub fn new(base: &'c mut RuleContext<'a>) -> Option<Self> {
        let checker = base.program?;
        Some(Self { base, checker })
    }

    pub fn checker(&self) -> &'a dyn TypeChecker {
        self.checker
    }
}

impl<'a> Deref for TypedRuleContext<'_, 'a> {
    type Target = RuleContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.base
    }
}

impl DerefMut for TypedRuleContext<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.base
    }
}

/// A rule that only looks at syntax
pub trait Rule {
    fn apply(&mut self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError>;
}

/// A rule that also consults the semantic model
pub trait TypedRule {
    fn apply(&mut self, ctx: &mut TypedRuleContext<'_, '_>) -> Result<(), RuleError>;
}

/// A rule created for one file
pub enum RuleInstance {
    Syntactic(Box<dyn Rule>),
    Typed(Box<dyn TypedRule>),
}

impl RuleInstance {
    /// Run the rule. Returns `false` if a typed rule was skipped for lack of
    /// a semantic model.
    pub fn apply(&mut self, ctx: &mut RuleContext<'_>) -> Result<bool, RuleError> {
        match self {
            RuleInstance::Syntactic(rule) => rule.apply(ctx).map(|_| true),
            RuleInstance::Typed(rule) => match TypedRuleContext::new(ctx) {
                Some(mut typed) => rule.apply(&mut typed).map(|_| true),
                None => Ok(false),
            },
        }
    }
}

/// Creates rule instances and describes them
pub trait RuleConstructor: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    /// Create the rule for the file in `ctx`
    fn create(&self, ctx: &RuleContext<'_>) -> Result<RuleInstance, RuleError>;
}
