// src/symbols/mod.rs
//
// Frontend-agnostic symbol access. Two providers implement SymbolSource,
// one over decoded metadata images and one over a source-level symbol
// graph, and both normalize into the same view structs at this seam. The
// rest of the crate never branches on where a symbol came from.

mod frontend;
mod metadata;

pub use frontend::{FrontendProvider, SourceModel};
pub use metadata::{BincodeDecoder, ImageDecoder, MetadataImage, MetadataProvider};

use serde::{Deserialize, Serialize};

/// Identity of one input assembly plus the assemblies it references, in
/// reference order. Reference graphs are acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyIdentity {
    pub name: String,
    #[serde(default)]
    pub references: Vec<String>,
}

impl AssemblyIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            references: Vec::new(),
        }
    }
}

/// Shape of a type reference as spelled in an input, before identities are
/// interned. Named references use metadata-style qualified names
/// (`System.Collections.Generic.List`); nested types join their containing
/// chain with `+` (`Outer+Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named {
        qualified: String,
        #[serde(default)]
        args: Vec<TypeExpr>,
    },
    Array {
        element: Box<TypeExpr>,
        rank: u8,
    },
    Pointer {
        pointee: Box<TypeExpr>,
    },
    Param {
        name: String,
    },
}

impl TypeExpr {
    pub fn named(qualified: impl Into<String>) -> Self {
        TypeExpr::Named {
            qualified: qualified.into(),
            args: Vec::new(),
        }
    }

    pub fn named_with(qualified: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Named {
            qualified: qualified.into(),
            args,
        }
    }

    pub fn array(element: TypeExpr, rank: u8) -> Self {
        TypeExpr::Array {
            element: Box::new(element),
            rank,
        }
    }

    pub fn pointer(pointee: TypeExpr) -> Self {
        TypeExpr::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        TypeExpr::Param { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTypeKind {
    Reference,
    Value,
    Interface,
    Enum,
    Delegate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamMode {
    Value,
    Ref,
    Out,
    In,
}

impl Default for ParamMode {
    fn default() -> Self {
        ParamMode::Value
    }
}

/// Normalized view of one type declaration. Providers build these on
/// demand; everything downstream of the trait sees only this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceType {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    pub kind: SourceTypeKind,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub base: Option<TypeExpr>,
    #[serde(default)]
    pub interfaces: Vec<TypeExpr>,
    #[serde(default)]
    pub underlying: Option<TypeExpr>,
    #[serde(default)]
    pub fields: Vec<SourceField>,
    #[serde(default)]
    pub methods: Vec<SourceMethod>,
}

impl SourceType {
    pub fn is_generic_definition(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Containing chain for nested types: `Outer+Inner` is contained in
    /// `Outer`. Top-level types have no container.
    pub fn containing(&self) -> Option<&str> {
        self.name.rsplit_once('+').map(|(outer, _)| outer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceField {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub const_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMethod {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    pub ret: TypeExpr,
    #[serde(default)]
    pub params: Vec<SourceParam>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_entry: bool,
    #[serde(default)]
    pub is_extern: bool,
    #[serde(default)]
    pub body: Option<u32>,
}

impl SourceMethod {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceParam {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub mode: ParamMode,
}

/// Capability interface over one input assembly's symbols. Object safe;
/// the pipeline works with `&dyn SymbolSource` only.
pub trait SymbolSource {
    fn assembly(&self) -> AssemblyIdentity;
    fn type_count(&self) -> usize;
    fn type_at(&self, index: usize) -> SourceType;
}
