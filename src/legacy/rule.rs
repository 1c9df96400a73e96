//! Run a legacy rule as a native rule

use super::{
    arrayify, LegacyFix, LegacyRule, LegacyRuleConstructor, LegacyRuleOptions, LegacySeverity,
};
use crate::ast::is_typescript_file;
use crate::diagnostic::{Fix, Replacement};
use crate::rule::{
    Deprecation, Rule, RuleConstructor, RuleContext, RuleError, RuleInstance, RuleMetadata,
};
use log::{debug, trace};
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

/// A legacy rule constructor presented as a [`RuleConstructor`]
pub struct LegacyRuleAdapter {
    delegate: Arc<dyn LegacyRuleConstructor>,
    name: String,
    metadata: RuleMetadata,
}

impl LegacyRuleAdapter {
    /// Name the wrapped rule reports under
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a legacy rule.
///
/// Without an explicit `name` the rule's own metadata name is used, and if
/// that is empty too, the file stem of the source file calling this function.
#[track_caller]
pub fn wrap_legacy_rule(
    delegate: Arc<dyn LegacyRuleConstructor>,
    name: Option<&str>,
) -> LegacyRuleAdapter {
    let caller = Location::caller().file();
    let legacy = delegate.metadata();

    let name = match name {
        Some(name) => name.to_string(),
        None if !legacy.rule_name.is_empty() => legacy.rule_name.clone(),
        None => file_stem(caller),
    };

    let deprecated = match &legacy.deprecation_message {
        None => Deprecation::No,
        Some(message) if message.is_empty() => Deprecation::Yes,
        Some(message) => Deprecation::WithMessage(message.clone()),
    };

    let mut metadata = RuleMetadata::new().with_deprecation(deprecated);
    if legacy.requires_type_info || delegate.is_typed() {
        metadata = metadata.typed();
    }
    if legacy.typescript_only {
        metadata = metadata.with_supports(is_typescript_file);
    }

    debug!("Wrapped legacy rule '{}'", name);
    LegacyRuleAdapter {
        delegate,
        name,
        metadata,
    }
}

fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

impl RuleConstructor for LegacyRuleAdapter {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn create(&self, ctx: &RuleContext<'_>) -> Result<RuleInstance, RuleError> {
        let options = LegacyRuleOptions {
            rule_arguments: arrayify(ctx.options()),
            rule_severity: LegacySeverity::Error,
            rule_name: self.name.clone(),
            disabled_intervals: Vec::new(),
        };
        Ok(RuleInstance::Syntactic(Box::new(AdaptedRule {
            delegate: self.delegate.construct(options),
        })))
    }
}

struct AdaptedRule {
    delegate: Box<dyn LegacyRule>,
}

impl Rule for AdaptedRule {
    fn apply(&mut self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        if !self.delegate.is_enabled() {
            trace!("Legacy rule '{}' is disabled", ctx.rule_name());
            return Ok(());
        }

        let file = ctx.source_file();
        let result = match ctx.program() {
            Some(program) => match self.delegate.as_typed() {
                Some(typed) => typed.apply_with_program(file, program),
                None => self.delegate.apply(file),
            },
            None => self.delegate.apply(file),
        };

        for failure in result {
            if failure.file_name() != file.file_name() {
                return Err(RuleError::ForeignFileMismatch {
                    expected: file.file_name().to_string(),
                    received: failure.file_name().to_string(),
                    rule: self.delegate.options().rule_name.clone(),
                });
            }
            ctx.add_failure(
                failure.start_position().position,
                failure.end_position().position,
                failure.failure(),
                Some(convert_fix(failure.fix())),
            )?;
        }
        Ok(())
    }
}

fn convert_fix(fix: Option<&LegacyFix>) -> Fix {
    let replacements = fix
        .map(|f| {
            f.replacements()
                .iter()
                .map(|r| Replacement::replace(r.start, r.end(), r.text.clone()))
                .collect()
        })
        .unwrap_or_default();
    Fix::new(replacements)
}
