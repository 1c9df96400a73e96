//! Semantic model consulted by typed rules
//!
//! Rules never see concrete type representations. They ask a [`TypeChecker`]
//! questions through small copyable handles ([`TypeId`], [`SymbolId`]), which
//! keeps the rule code independent of whichever type system backs the run.

pub mod predicates;
mod store;

pub use predicates::{is_async_iterable_like, is_promise_like};
pub use store::{ObjectTypeBuilder, TypeStore};

use crate::ast::NodeId;
use std::fmt;

/// Handle to a type owned by a [`TypeChecker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// Handle to a property symbol owned by a [`TypeChecker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// Symbols built into the language that protocols are keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownSymbol {
    Iterator,
    AsyncIterator,
    HasInstance,
    ToPrimitive,
}

impl fmt::Display for WellKnownSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellKnownSymbol::Iterator => write!(f, "Symbol.iterator"),
            WellKnownSymbol::AsyncIterator => write!(f, "Symbol.asyncIterator"),
            WellKnownSymbol::HasInstance => write!(f, "Symbol.hasInstance"),
            WellKnownSymbol::ToPrimitive => write!(f, "Symbol.toPrimitive"),
        }
    }
}

/// Key of a property: a plain name or a well-known symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Name(String),
    WellKnown(WellKnownSymbol),
}

impl PropertyKey {
    pub fn name(name: impl Into<String>) -> Self {
        PropertyKey::Name(name.into())
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Name(name.to_string())
    }
}

impl From<WellKnownSymbol> for PropertyKey {
    fn from(symbol: WellKnownSymbol) -> Self {
        PropertyKey::WellKnown(symbol)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => write!(f, "{}", name),
            PropertyKey::WellKnown(symbol) => write!(f, "[{}]", symbol),
        }
    }
}

/// A call signature. Only its presence matters to the built-in rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub parameters: Vec<String>,
}

impl Signature {
    pub fn new(parameters: &[&str]) -> Self {
        Self {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Type information for the nodes of one source file
pub trait TypeChecker: Send + Sync {
    /// Declared or inferred type of the expression at `node`
    fn type_at_location(&self, node: NodeId) -> TypeId;

    /// Type used for property access (e.g. `number` becomes `Number`)
    fn apparent_type(&self, ty: TypeId) -> TypeId;

    /// Check for the dynamic `any` type
    fn is_any(&self, ty: TypeId) -> bool;

    /// Members of a union type, `None` for any other type
    fn union_members(&self, ty: TypeId) -> Option<&[TypeId]>;

    /// Look up a property by key
    fn property(&self, ty: TypeId, key: &PropertyKey) -> Option<SymbolId>;

    /// Type of a property symbol as seen from `node`
    fn type_of_symbol_at_location(&self, symbol: SymbolId, node: NodeId) -> TypeId;

    /// Call signatures of a type
    fn call_signatures(&self, ty: TypeId) -> &[Signature];
}
