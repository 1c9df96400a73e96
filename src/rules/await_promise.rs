//! `await-promise`: flags `await` and `for await` on values that are neither
//! promises nor async iterables.
//!
//! Both keywords are no-ops on such values (apart from deferring execution by a
//! tick), so the fix simply removes them.

use crate::ast::{NodeKind, SourceFile};
use crate::diagnostic::{Fix, Replacement};
use crate::rule::{
    RuleConstructor, RuleContext, RuleError, RuleInstance, RuleMetadata, TypedRule,
    TypedRuleContext,
};
use crate::semantic::{is_async_iterable_like, is_promise_like};

pub const NAME: &str = "await-promise";

const AWAIT_KEYWORD: &str = "await";
const AWAIT_MESSAGE: &str = "Unnecessary 'await' of a non-Promise value.";
const FOR_AWAIT_MESSAGE: &str = "Unnecessary 'for await' of a non-AsyncIterable value.";

/// Creates the `await-promise` rule
pub struct AwaitPromiseRule {
    metadata: RuleMetadata,
}

impl Default for AwaitPromiseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl AwaitPromiseRule {
    pub fn new() -> Self {
        Self {
            metadata: RuleMetadata::new()
                .typed()
                .with_supports(supports)
                .with_description("Disallows awaiting a value that is not a Promise"),
        }
    }
}

fn supports(file: &SourceFile) -> bool {
    !file.is_declaration_file()
}

impl RuleConstructor for AwaitPromiseRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<RuleInstance, RuleError> {
        Ok(RuleInstance::Typed(Box::new(AwaitPromise)))
    }
}

struct AwaitPromise;

impl TypedRule for AwaitPromise {
    fn apply(&mut self, ctx: &mut TypedRuleContext<'_, '_>) -> Result<(), RuleError> {
        let file = ctx.source_file();
        let checker = ctx.checker();
        // type queries go through the expression itself so contextual types resolve
        let apparent_type = |id| checker.apparent_type(checker.type_at_location(id));

        for node in ctx.flattened_ast() {
            match &node.kind {
                NodeKind::AwaitExpression { expression } => {
                    let expression = file.node(*expression);
                    if is_promise_like(checker, apparent_type(expression.id), expression.id) {
                        continue;
                    }
                    // the expression's full start is right behind the keyword
                    let keyword_start = expression
                        .pos
                        .checked_sub(AWAIT_KEYWORD.len())
                        .ok_or_else(|| RuleError::Other {
                            rule: ctx.rule_name().to_string(),
                            message: format!(
                                "await expression {} has no room for its keyword",
                                node.id
                            ),
                        })?;
                    ctx.add_failure(
                        keyword_start,
                        node.end,
                        AWAIT_MESSAGE,
                        Some(Fix::single(Replacement::delete(
                            keyword_start,
                            expression.start(file),
                        ))),
                    )?;
                }
                NodeKind::ForOfStatement {
                    await_modifier: Some(modifier),
                    expression,
                    statement,
                    ..
                } => {
                    if is_async_iterable_like(checker, apparent_type(*expression)) {
                        continue;
                    }
                    ctx.add_failure(
                        node.start(file),
                        file.node(*statement).pos,
                        FOR_AWAIT_MESSAGE,
                        Some(Fix::single(Replacement::delete(modifier.pos, modifier.end))),
                    )?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
