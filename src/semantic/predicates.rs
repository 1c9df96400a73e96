//! Structural type tests shared by typed rules
//!
//! Both predicates answer `true` whenever the answer can't be ruled out: for
//! `any`, and for a union as soon as one member qualifies.

use super::{PropertyKey, TypeChecker, TypeId, WellKnownSymbol};
use crate::ast::NodeId;

/// Check whether a value of type `ty` can be awaited meaningfully.
///
/// A type is promise-like when it has a `then` property with at least one call
/// signature. The signature's parameters and return type are not inspected.
/// `node` is the expression the type belongs to; it is used to resolve the type
/// of `then` in context.
pub fn is_promise_like(checker: &dyn TypeChecker, ty: TypeId, node: NodeId) -> bool {
    any_constituent(checker, ty, &|t| is_thenable(checker, t, node))
}

/// Check whether a value of type `ty` can be used in `for await`.
///
/// Only the presence of a `[Symbol.asyncIterator]` property is checked.
pub fn is_async_iterable_like(checker: &dyn TypeChecker, ty: TypeId) -> bool {
    let key = PropertyKey::WellKnown(WellKnownSymbol::AsyncIterator);
    any_constituent(checker, ty, &|t| checker.property(t, &key).is_some())
}

fn is_thenable(checker: &dyn TypeChecker, ty: TypeId, node: NodeId) -> bool {
    checker
        .property(ty, &PropertyKey::name("then"))
        .is_some_and(|then| {
            let then_type = checker.type_of_symbol_at_location(then, node);
            !checker.call_signatures(then_type).is_empty()
        })
}

fn any_constituent(checker: &dyn TypeChecker, ty: TypeId, test: &dyn Fn(TypeId) -> bool) -> bool {
    if checker.is_any(ty) {
        return true;
    }
    match checker.union_members(ty) {
        Some(members) => members.iter().any(|&m| any_constituent(checker, m, test)),
        None => test(ty),
    }
}
