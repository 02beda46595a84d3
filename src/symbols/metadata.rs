// src/symbols/metadata.rs
//
// Symbol provider over a decoded metadata image: flat index-based tables
// with a string heap and a shape table, the layout a binary metadata
// reader naturally produces. The byte-level container codec is behind the
// ImageDecoder trait; a bincode codec ships as the default.

use serde::{Deserialize, Serialize};

use super::{
    AssemblyIdentity, ParamMode, SourceField, SourceMethod, SourceParam, SourceType,
    SourceTypeKind, SymbolSource, TypeExpr,
};
use crate::errors::Error;

pub mod method_flags {
    pub const STATIC: u16 = 1 << 0;
    pub const VIRTUAL: u16 = 1 << 1;
    pub const ABSTRACT: u16 = 1 << 2;
    pub const EXTERN: u16 = 1 << 3;
    pub const ENTRY: u16 = 1 << 4;
}

/// One row of the type-shape table. Rows may only reference rows with a
/// lower index, so a well-formed table is a DAG by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeRow {
    Named { name: u32, args: Vec<u32> },
    Array { element: u32, rank: u8 },
    Pointer { pointee: u32 },
    Param { name: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRow {
    pub namespace: u32,
    pub name: u32,
    pub kind: SourceTypeKind,
    pub type_params: Vec<u32>,
    pub base: Option<u32>,
    pub interfaces: Vec<u32>,
    pub underlying: Option<u32>,
    pub first_field: u32,
    pub field_count: u32,
    pub first_method: u32,
    pub method_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRow {
    pub name: u32,
    pub shape: u32,
    pub is_static: bool,
    pub const_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRow {
    pub name: u32,
    pub type_params: Vec<u32>,
    pub ret: u32,
    pub first_param: u32,
    pub param_count: u32,
    pub flags: u16,
    pub body: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamRow {
    pub name: u32,
    pub shape: u32,
    pub mode: ParamMode,
}

/// Decoded form of one compiled metadata image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataImage {
    pub assembly: String,
    pub references: Vec<String>,
    pub strings: Vec<String>,
    pub shapes: Vec<ShapeRow>,
    pub types: Vec<TypeRow>,
    pub fields: Vec<FieldRow>,
    pub methods: Vec<MethodRow>,
    pub params: Vec<ParamRow>,
}

impl MetadataImage {
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Builds an image from normalized type views, interning strings and
    /// laying out shape rows in post-order so every row only references
    /// lower rows.
    pub fn from_types(identity: &AssemblyIdentity, source_types: &[SourceType]) -> Self {
        let mut image = Self {
            assembly: identity.name.clone(),
            references: identity.references.clone(),
            strings: Vec::new(),
            shapes: Vec::new(),
            types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            params: Vec::new(),
        };
        let mut strings = rustc_hash::FxHashMap::default();
        for ty in source_types {
            let first_field = image.fields.len() as u32;
            for field in &ty.fields {
                let shape = image.shape_row(&mut strings, &field.ty);
                let name = image.string_row(&mut strings, &field.name);
                image.fields.push(FieldRow {
                    name,
                    shape,
                    is_static: field.is_static,
                    const_value: field.const_value,
                });
            }
            let first_method = image.methods.len() as u32;
            for method in &ty.methods {
                let first_param = image.params.len() as u32;
                for param in &method.params {
                    let shape = image.shape_row(&mut strings, &param.ty);
                    let name = image.string_row(&mut strings, &param.name);
                    image.params.push(ParamRow {
                        name,
                        shape,
                        mode: param.mode,
                    });
                }
                let ret = image.shape_row(&mut strings, &method.ret);
                let name = image.string_row(&mut strings, &method.name);
                let type_params = method
                    .type_params
                    .iter()
                    .map(|p| image.string_row(&mut strings, p))
                    .collect();
                let mut flags = 0u16;
                if method.is_static {
                    flags |= method_flags::STATIC;
                }
                if method.is_virtual {
                    flags |= method_flags::VIRTUAL;
                }
                if method.is_abstract {
                    flags |= method_flags::ABSTRACT;
                }
                if method.is_extern {
                    flags |= method_flags::EXTERN;
                }
                if method.is_entry {
                    flags |= method_flags::ENTRY;
                }
                image.methods.push(MethodRow {
                    name,
                    type_params,
                    ret,
                    first_param,
                    param_count: method.params.len() as u32,
                    flags,
                    body: method.body,
                });
            }
            let base = ty.base.as_ref().map(|b| image.shape_row(&mut strings, b));
            let interfaces = ty
                .interfaces
                .iter()
                .map(|i| image.shape_row(&mut strings, i))
                .collect();
            let underlying = ty
                .underlying
                .as_ref()
                .map(|u| image.shape_row(&mut strings, u));
            let namespace = image.string_row(&mut strings, &ty.namespace);
            let name = image.string_row(&mut strings, &ty.name);
            let type_params = ty
                .type_params
                .iter()
                .map(|p| image.string_row(&mut strings, p))
                .collect();
            image.types.push(TypeRow {
                namespace,
                name,
                kind: ty.kind,
                type_params,
                base,
                interfaces,
                underlying,
                first_field,
                field_count: ty.fields.len() as u32,
                first_method,
                method_count: ty.methods.len() as u32,
            });
        }
        image
    }

    fn string_row(&mut self, lookup: &mut rustc_hash::FxHashMap<String, u32>, text: &str) -> u32 {
        if let Some(idx) = lookup.get(text) {
            return *idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(text.to_string());
        lookup.insert(text.to_string(), idx);
        idx
    }

    fn shape_row(&mut self, strings: &mut rustc_hash::FxHashMap<String, u32>, expr: &TypeExpr) -> u32 {
        let row = match expr {
            TypeExpr::Named { qualified, args } => {
                let args = args.iter().map(|a| self.shape_row(strings, a)).collect();
                let name = self.string_row(strings, qualified);
                ShapeRow::Named { name, args }
            }
            TypeExpr::Array { element, rank } => {
                let element = self.shape_row(strings, element);
                ShapeRow::Array {
                    element,
                    rank: *rank,
                }
            }
            TypeExpr::Pointer { pointee } => {
                let pointee = self.shape_row(strings, pointee);
                ShapeRow::Pointer { pointee }
            }
            TypeExpr::Param { name } => {
                let name = self.string_row(strings, name);
                ShapeRow::Param { name }
            }
        };
        let idx = self.shapes.len() as u32;
        self.shapes.push(row);
        idx
    }
}

/// Byte-level container decoding is external to this crate's core; this
/// trait is the seam. `origin` is only used for error context.
pub trait ImageDecoder {
    fn decode(&self, origin: &str, bytes: &[u8]) -> Result<MetadataImage, Error>;
}

/// Default container codec.
#[derive(Debug, Default)]
pub struct BincodeDecoder;

impl ImageDecoder for BincodeDecoder {
    fn decode(&self, origin: &str, bytes: &[u8]) -> Result<MetadataImage, Error> {
        bincode::deserialize(bytes).map_err(|err| Error::MetadataDecode {
            assembly: origin.to_string(),
            detail: err.to_string(),
        })
    }
}

#[derive(Debug)]
pub struct MetadataProvider {
    image: MetadataImage,
}

impl MetadataProvider {
    pub fn new(image: MetadataImage) -> Result<Self, Error> {
        validate(&image)?;
        Ok(Self { image })
    }

    pub fn from_bytes(
        origin: &str,
        bytes: &[u8],
        decoder: &dyn ImageDecoder,
    ) -> Result<Self, Error> {
        Self::new(decoder.decode(origin, bytes)?)
    }

    fn text(&self, idx: u32) -> &str {
        &self.image.strings[idx as usize]
    }

    fn shape(&self, idx: u32) -> TypeExpr {
        match &self.image.shapes[idx as usize] {
            ShapeRow::Named { name, args } => TypeExpr::Named {
                qualified: self.text(*name).to_string(),
                args: args.iter().map(|a| self.shape(*a)).collect(),
            },
            ShapeRow::Array { element, rank } => TypeExpr::Array {
                element: Box::new(self.shape(*element)),
                rank: *rank,
            },
            ShapeRow::Pointer { pointee } => TypeExpr::Pointer {
                pointee: Box::new(self.shape(*pointee)),
            },
            ShapeRow::Param { name } => TypeExpr::Param {
                name: self.text(*name).to_string(),
            },
        }
    }

    fn field_view(&self, row: &FieldRow) -> SourceField {
        SourceField {
            name: self.text(row.name).to_string(),
            ty: self.shape(row.shape),
            is_static: row.is_static,
            const_value: row.const_value,
        }
    }

    fn method_view(&self, row: &MethodRow) -> SourceMethod {
        let params = (row.first_param..row.first_param + row.param_count)
            .map(|idx| {
                let param = &self.image.params[idx as usize];
                SourceParam {
                    name: self.text(param.name).to_string(),
                    ty: self.shape(param.shape),
                    mode: param.mode,
                }
            })
            .collect();
        SourceMethod {
            name: self.text(row.name).to_string(),
            type_params: row
                .type_params
                .iter()
                .map(|p| self.text(*p).to_string())
                .collect(),
            ret: self.shape(row.ret),
            params,
            is_static: row.flags & method_flags::STATIC != 0,
            is_virtual: row.flags & method_flags::VIRTUAL != 0,
            is_abstract: row.flags & method_flags::ABSTRACT != 0,
            is_entry: row.flags & method_flags::ENTRY != 0,
            is_extern: row.flags & method_flags::EXTERN != 0,
            body: row.body,
        }
    }
}

impl SymbolSource for MetadataProvider {
    fn assembly(&self) -> AssemblyIdentity {
        AssemblyIdentity {
            name: self.image.assembly.clone(),
            references: self.image.references.clone(),
        }
    }

    fn type_count(&self) -> usize {
        self.image.types.len()
    }

    fn type_at(&self, index: usize) -> SourceType {
        let row = &self.image.types[index];
        SourceType {
            namespace: self.text(row.namespace).to_string(),
            name: self.text(row.name).to_string(),
            kind: row.kind,
            type_params: row
                .type_params
                .iter()
                .map(|p| self.text(*p).to_string())
                .collect(),
            base: row.base.map(|b| self.shape(b)),
            interfaces: row.interfaces.iter().map(|i| self.shape(*i)).collect(),
            underlying: row.underlying.map(|u| self.shape(u)),
            fields: (row.first_field..row.first_field + row.field_count)
                .map(|idx| self.field_view(&self.image.fields[idx as usize]))
                .collect(),
            methods: (row.first_method..row.first_method + row.method_count)
                .map(|idx| self.method_view(&self.image.methods[idx as usize]))
                .collect(),
        }
    }
}

/// Bounds-checks every index so views can index without checks. Shape rows
/// must only reference lower rows, which also rules out cycles.
fn validate(image: &MetadataImage) -> Result<(), Error> {
    let fail = |detail: String| Error::MetadataDecode {
        assembly: image.assembly.clone(),
        detail,
    };
    let strings = image.strings.len() as u32;
    let shapes = image.shapes.len() as u32;
    let check_str = |idx: u32, what: &str| {
        if idx >= strings {
            Err(fail(format!("{what} string index {idx} out of range")))
        } else {
            Ok(())
        }
    };
    let check_shape = |idx: u32, what: &str| {
        if idx >= shapes {
            Err(fail(format!("{what} shape index {idx} out of range")))
        } else {
            Ok(())
        }
    };

    for (row_idx, shape) in image.shapes.iter().enumerate() {
        let row_idx = row_idx as u32;
        match shape {
            ShapeRow::Named { name, args } => {
                check_str(*name, "shape name")?;
                for arg in args {
                    if *arg >= row_idx {
                        return Err(fail(format!(
                            "shape row {row_idx} references non-lower row {arg}"
                        )));
                    }
                }
            }
            ShapeRow::Array { element, .. } => {
                if *element >= row_idx {
                    return Err(fail(format!("shape row {row_idx} references itself or later")));
                }
            }
            ShapeRow::Pointer { pointee } => {
                if *pointee >= row_idx {
                    return Err(fail(format!("shape row {row_idx} references itself or later")));
                }
            }
            ShapeRow::Param { name } => check_str(*name, "shape param")?,
        }
    }

    for row in &image.fields {
        check_str(row.name, "field name")?;
        check_shape(row.shape, "field type")?;
    }
    for row in &image.params {
        check_str(row.name, "param name")?;
        check_shape(row.shape, "param type")?;
    }
    for row in &image.methods {
        check_str(row.name, "method name")?;
        check_shape(row.ret, "method return")?;
        for p in &row.type_params {
            check_str(*p, "method type param")?;
        }
        if row.first_param + row.param_count > image.params.len() as u32 {
            return Err(fail("method param range out of bounds".to_string()));
        }
    }
    for row in &image.types {
        check_str(row.namespace, "type namespace")?;
        check_str(row.name, "type name")?;
        for p in &row.type_params {
            check_str(*p, "type param")?;
        }
        if let Some(base) = row.base {
            check_shape(base, "base type")?;
        }
        for iface in &row.interfaces {
            check_shape(*iface, "interface")?;
        }
        if let Some(underlying) = row.underlying {
            check_shape(underlying, "enum underlying")?;
        }
        if row.first_field + row.field_count > image.fields.len() as u32 {
            return Err(fail("type field range out of bounds".to_string()));
        }
        if row.first_method + row.method_count > image.methods.len() as u32 {
            return Err(fail("type method range out of bounds".to_string()));
        }
    }
    Ok(())
}
