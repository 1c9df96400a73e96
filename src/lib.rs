//! Skald - Type-Aware Lint Engine
//!
//! A lint engine for TypeScript-like syntax trees. Rules inspect a parsed
//! [`SourceFile`] and, when they need it, the types of its nodes through a
//! [`TypeChecker`]. Rules and formatters written against the older lint API
//! run unchanged through the adapters in [`legacy`].
//!
//! # Architecture
//!
//! ```text
//! Config -> Linter -> RuleConstructor -> RuleInstance -> Failure -> Fixer
//!                                                           |
//!                                                           v
//!                                                       Formatter
//! ```
//!
//! The linter resolves the rules configured for each file, creates a fresh
//! instance per file, collects failures, drops the ones switched off by
//! `skald-disable` comments and hands the per-file summaries to a formatter.
//!
//! # Configuration
//!
//! ```yaml
//! rules:
//!   await-promise: error
//!   legacy-rule:
//!     severity: warning
//!     options: [true, "check-parameters"]
//!
//! overrides:
//!   - files: ["**/*.test.ts"]
//!     rules:
//!       await-promise: off
//! ```

pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod fixer;
pub mod legacy;
pub mod line_switch;
pub mod output;
pub mod rule;
pub mod rules;
pub mod semantic;

#[cfg(test)]
mod test_util;

// Re-export main types
pub use ast::{NodeId, SourceFile, SourceText, TextRange};
pub use config::{Config, ConfigError, RuleConfig, RuleSeverity};
pub use diagnostic::{Failure, FileSummary, Fix, Replacement, Severity};
pub use engine::{CompilationUnit, FixedUnit, LintError, Linter};
pub use fixer::{apply_fixes, FixOutput};
pub use legacy::{wrap_legacy_formatter, wrap_legacy_rule};
pub use line_switch::LineSwitches;
pub use output::{Formatter, JsonFormatter, StylishFormatter};
pub use rule::{
    Deprecation, Rule, RuleConstructor, RuleContext, RuleError, RuleInstance, RuleMetadata,
    TypedRule, TypedRuleContext,
};
pub use semantic::{TypeChecker, TypeStore};
