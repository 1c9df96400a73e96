//! Built-in rules

pub mod await_promise;

pub use await_promise::AwaitPromiseRule;

use crate::rule::RuleConstructor;
use std::sync::Arc;

/// Get all built-in rules, keyed by name
pub fn builtin_rules() -> Vec<(&'static str, Arc<dyn RuleConstructor>)> {
    vec![(await_promise::NAME, Arc::new(AwaitPromiseRule::new()))]
}
