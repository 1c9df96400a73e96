//! In-memory type table implementing [`TypeChecker`]

use super::{PropertyKey, Signature, SymbolId, TypeChecker, TypeId, WellKnownSymbol};
use crate::ast::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum TypeData {
    Any,
    Primitive(String),
    Object {
        name: String,
        properties: Vec<SymbolId>,
        signatures: Vec<Signature>,
    },
    Union(Vec<TypeId>),
}

#[derive(Debug, Clone)]
struct SymbolData {
    key: PropertyKey,
    ty: TypeId,
    at_location: HashMap<NodeId, TypeId>,
}

/// A semantic model populated up front by whoever resolved the types.
///
/// Nodes without a recorded type resolve to `any`, and types without a
/// recorded apparent type are their own apparent type.
#[derive(Debug, Clone)]
pub struct TypeStore {
    types: Vec<TypeData>,
    symbols: Vec<SymbolData>,
    apparent: HashMap<TypeId, TypeId>,
    node_types: HashMap<NodeId, TypeId>,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        Self {
            types: vec![TypeData::Any],
            symbols: Vec::new(),
            apparent: HashMap::new(),
            node_types: HashMap::new(),
        }
    }

    /// The dynamic type
    pub fn any(&self) -> TypeId {
        TypeId(0)
    }

    /// A primitive type such as `number` or `string`
    pub fn primitive(&mut self, name: &str) -> TypeId {
        self.push(TypeData::Primitive(name.to_string()))
    }

    /// Start an object type
    pub fn object(&mut self, name: &str) -> ObjectTypeBuilder<'_> {
        ObjectTypeBuilder {
            store: self,
            name: name.to_string(),
            properties: Vec::new(),
            signatures: Vec::new(),
        }
    }

    /// A callable object type with a single signature
    pub fn function(&mut self, signature: Signature) -> TypeId {
        self.object("Function").call_signature(signature).build()
    }

    /// A union of existing types
    pub fn union(&mut self, members: Vec<TypeId>) -> TypeId {
        self.push(TypeData::Union(members))
    }

    pub fn set_apparent_type(&mut self, ty: TypeId, apparent: TypeId) {
        self.apparent.insert(ty, apparent);
    }

    pub fn set_node_type(&mut self, node: NodeId, ty: TypeId) {
        self.node_types.insert(node, ty);
    }

    /// Record the type a property has when seen from a specific node,
    /// e.g. after instantiating a generic.
    pub fn set_symbol_type_at(&mut self, symbol: SymbolId, node: NodeId, ty: TypeId) {
        if let Some(data) = self.symbols.get_mut(symbol.0 as usize) {
            data.at_location.insert(node, ty);
        }
    }

    /// Human-readable name of a type
    pub fn type_name(&self, ty: TypeId) -> String {
        match self.types.get(ty.0 as usize) {
            Some(TypeData::Any) | None => "any".to_string(),
            Some(TypeData::Primitive(name)) | Some(TypeData::Object { name, .. }) => name.clone(),
            Some(TypeData::Union(members)) => members
                .iter()
                .map(|m| self.type_name(*m))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    fn data(&self, ty: TypeId) -> &TypeData {
        // slot 0 always holds `any`
        self.types.get(ty.0 as usize).unwrap_or(&self.types[0])
    }
}

impl TypeChecker for TypeStore {
    fn type_at_location(&self, node: NodeId) -> TypeId {
        self.node_types.get(&node).copied().unwrap_or(self.any())
    }

    fn apparent_type(&self, ty: TypeId) -> TypeId {
        self.apparent.get(&ty).copied().unwrap_or(ty)
    }

    fn is_any(&self, ty: TypeId) -> bool {
        matches!(self.data(ty), TypeData::Any)
    }

    fn union_members(&self, ty: TypeId) -> Option<&[TypeId]> {
        match self.data(ty) {
            TypeData::Union(members) => Some(members.as_slice()),
            _ => None,
        }
    }

    fn property(&self, ty: TypeId, key: &PropertyKey) -> Option<SymbolId> {
        match self.data(ty) {
            TypeData::Object { properties, .. } => properties
                .iter()
                .copied()
                .find(|s| self.symbols[s.0 as usize].key == *key),
            _ => None,
        }
    }

    fn type_of_symbol_at_location(&self, symbol: SymbolId, node: NodeId) -> TypeId {
        match self.symbols.get(symbol.0 as usize) {
            Some(data) => data.at_location.get(&node).copied().unwrap_or(data.ty),
            None => self.any(),
        }
    }

    fn call_signatures(&self, ty: TypeId) -> &[Signature] {
        match self.data(ty) {
            TypeData::Object { signatures, .. } => signatures.as_slice(),
            _ => &[],
        }
    }
}

/// Builder returned by [`TypeStore::object`]
pub struct ObjectTypeBuilder<'s> {
    store: &'s mut TypeStore,
    name: String,
    properties: Vec<(PropertyKey, TypeId)>,
    signatures: Vec<Signature>,
}

impl ObjectTypeBuilder<'_> {
    /// Add a named property
    pub fn property(mut self, name: &str, ty: TypeId) -> Self {
        self.properties.push((PropertyKey::name(name), ty));
        self
    }

    /// Add a property keyed by a well-known symbol
    pub fn symbol_property(mut self, symbol: WellKnownSymbol, ty: TypeId) -> Self {
        self.properties.push((PropertyKey::WellKnown(symbol), ty));
        self
    }

    /// Make the type callable
    pub fn call_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn build(self) -> TypeId {
        let store = self.store;
        let properties = self
            .properties
            .into_iter()
            .map(|(key, ty)| {
                let id = SymbolId(store.symbols.len() as u32);
                store.symbols.push(SymbolData {
                    key,
                    ty,
                    at_location: HashMap::new(),
                });
                id
            })
            .collect();
        store.push(TypeData::Object {
            name: self.name,
            properties,
            signatures: self.signatures,
        })
    }
}
