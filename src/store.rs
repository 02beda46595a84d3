// src/store.rs
//
// Definition registry and symbol-graph ingestion. Providers are drained
// into TypeDef/MethodDef/FieldDef records indexed by TypeKey; type
// references become interned arena terms at this point, so everything
// downstream works with ids.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::{SharedArena, Ty, TypeId, TypeIdVec};
use crate::errors::Error;
use crate::identity::{NameId, NameTable, TypeKey};
use crate::lower::BodyHandle;
use crate::symbols::{
    AssemblyIdentity, ParamMode, SourceField, SourceMethod, SourceType, SourceTypeKind,
    SymbolSource, TypeExpr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDefId(u32);

impl TypeDefId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub fn new_for_test(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u32);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(u32);

impl FieldId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefKind {
    Reference,
    Value,
    Interface,
    Enum,
    Delegate,
}

impl TypeDefKind {
    fn from_source(kind: SourceTypeKind) -> Self {
        match kind {
            SourceTypeKind::Reference => TypeDefKind::Reference,
            SourceTypeKind::Value => TypeDefKind::Value,
            SourceTypeKind::Interface => TypeDefKind::Interface,
            SourceTypeKind::Enum => TypeDefKind::Enum,
            SourceTypeKind::Delegate => TypeDefKind::Delegate,
        }
    }

    /// Enums and delegates are emitted as value/reference structures.
    pub fn is_value_layout(self) -> bool {
        matches!(self, TypeDefKind::Value | TypeDefKind::Enum)
    }
}

/// Well-known core types that get native spellings or special handling
/// during emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    Object,
    String,
    Void,
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    IntPtr,
    UIntPtr,
}

impl Special {
    fn of(namespace: &str, name: &str) -> Option<Special> {
        if namespace != "System" {
            return None;
        }
        Some(match name {
            "Object" => Special::Object,
            "String" => Special::String,
            "Void" => Special::Void,
            "Boolean" => Special::Bool,
            "Char" => Special::Char,
            "SByte" => Special::I8,
            "Byte" => Special::U8,
            "Int16" => Special::I16,
            "UInt16" => Special::U16,
            "Int32" => Special::I32,
            "UInt32" => Special::U32,
            "Int64" => Special::I64,
            "UInt64" => Special::U64,
            "Single" => Special::F32,
            "Double" => Special::F64,
            "IntPtr" => Special::IntPtr,
            "UIntPtr" => Special::UIntPtr,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Special::Object | Special::String)
    }
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub id: TypeDefId,
    pub key: TypeKey,
    pub kind: TypeDefKind,
    pub special: Option<Special>,
    pub is_external: bool,
    pub type_params: Vec<NameId>,
    /// `Named { def, args: own params }` for generic definitions, plain
    /// `Named { def }` otherwise.
    pub self_ty: TypeId,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub underlying: Option<TypeId>,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
}

impl TypeDef {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SigParam {
    pub name: NameId,
    pub ty: TypeId,
    pub mode: ParamMode,
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub id: MethodId,
    pub owner: TypeDefId,
    pub name: NameId,
    pub type_params: Vec<NameId>,
    pub ret: TypeId,
    pub params: Vec<SigParam>,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub is_entry: bool,
    pub is_extern: bool,
    pub body: Option<BodyHandle>,
}

impl MethodDef {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub id: FieldId,
    pub owner: TypeDefId,
    pub name: NameId,
    pub ty: TypeId,
    pub is_static: bool,
    pub const_value: Option<i64>,
}

/// The unified graph: every ingested assembly's definitions, one name
/// table, one shared arena.
#[derive(Debug)]
pub struct SymbolGraph {
    pub names: NameTable,
    pub arena: SharedArena,
    types: Vec<TypeDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    by_key: FxHashMap<TypeKey, TypeDefId>,
    assembly: AssemblyIdentity,
    entry: Option<MethodId>,
}

impl SymbolGraph {
    /// Ingests the primary assembly and its references in one call so that
    /// cross-assembly references resolve regardless of input order: first
    /// every type shell is declared, then every shell is filled.
    pub fn ingest(
        primary: &dyn SymbolSource,
        references: &[&dyn SymbolSource],
    ) -> Result<Self, Error> {
        let mut graph = Self {
            names: NameTable::new(),
            arena: SharedArena::new(),
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            by_key: FxHashMap::default(),
            assembly: primary.assembly(),
            entry: None,
        };

        let mut declared: Vec<(TypeDefId, SourceType)> = Vec::new();
        let mut sources: Vec<(&dyn SymbolSource, bool)> =
            references.iter().map(|s| (*s, true)).collect();
        sources.push((primary, false));

        for (source, external) in &sources {
            for index in 0..source.type_count() {
                let view = source.type_at(index);
                if let Some(id) = graph.declare_type(&view, *external) {
                    declared.push((id, view));
                }
            }
        }

        for (id, view) in declared {
            graph.fill_type(id, view)?;
        }

        Ok(graph)
    }

    fn declare_type(&mut self, view: &SourceType, external: bool) -> Option<TypeDefId> {
        let key = TypeKey {
            namespace: self.names.namespace(&view.namespace),
            name: self.names.intern(&view.name),
            arity: view.type_params.len() as u8,
        };
        if self.by_key.contains_key(&key) {
            tracing::warn!(
                name = %self.names.type_key_display(key),
                "type declared more than once across inputs, keeping the first declaration"
            );
            return None;
        }
        let id = TypeDefId(self.types.len() as u32);
        let special = Special::of(&view.namespace, &view.name);
        self.types.push(TypeDef {
            id,
            key,
            kind: TypeDefKind::from_source(view.kind),
            special,
            is_external: external,
            type_params: Vec::new(),
            self_ty: self.arena.named(id, TypeIdVec::new()),
            base: None,
            interfaces: Vec::new(),
            underlying: None,
            fields: Vec::new(),
            methods: Vec::new(),
        });
        self.by_key.insert(key, id);
        Some(id)
    }

    fn fill_type(&mut self, id: TypeDefId, view: SourceType) -> Result<(), Error> {
        let owner_display = self.names.type_key_display(self.types[id.index()].key);

        let type_params: Vec<NameId> =
            view.type_params.iter().map(|p| self.names.intern(p)).collect();
        let self_ty = if type_params.is_empty() {
            self.types[id.index()].self_ty
        } else {
            let args: TypeIdVec = type_params.iter().map(|p| self.arena.param(*p)).collect();
            self.arena.named(id, args)
        };

        let base = view
            .base
            .as_ref()
            .map(|expr| self.intern_expr(expr, &owner_display))
            .transpose()?;
        let mut interfaces = Vec::new();
        let mut seen = FxHashSet::default();
        for expr in &view.interfaces {
            let iface = self.intern_expr(expr, &owner_display)?;
            if seen.insert(iface) {
                interfaces.push(iface);
            }
        }
        let underlying = view
            .underlying
            .as_ref()
            .map(|expr| self.intern_expr(expr, &owner_display))
            .transpose()?;

        let mut field_ids = Vec::with_capacity(view.fields.len());
        for field in &view.fields {
            field_ids.push(self.add_field(id, field, &owner_display)?);
        }
        let mut method_ids = Vec::with_capacity(view.methods.len());
        for method in &view.methods {
            method_ids.push(self.add_method(id, method, &owner_display)?);
        }

        let def = &mut self.types[id.index()];
        def.type_params = type_params;
        def.self_ty = self_ty;
        def.base = base;
        def.interfaces = interfaces;
        def.underlying = underlying;
        def.fields = field_ids;
        def.methods = method_ids;
        Ok(())
    }

    fn add_field(
        &mut self,
        owner: TypeDefId,
        field: &SourceField,
        owner_display: &str,
    ) -> Result<FieldId, Error> {
        let ty = self.intern_expr(&field.ty, owner_display)?;
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(FieldDef {
            id,
            owner,
            name: self.names.intern(&field.name),
            ty,
            is_static: field.is_static,
            const_value: field.const_value,
        });
        Ok(id)
    }

    fn add_method(
        &mut self,
        owner: TypeDefId,
        method: &SourceMethod,
        owner_display: &str,
    ) -> Result<MethodId, Error> {
        let referenced_from = format!("{}.{}", owner_display, method.name);
        let ret = self.intern_expr(&method.ret, &referenced_from)?;
        let mut params = Vec::with_capacity(method.params.len());
        for param in &method.params {
            params.push(SigParam {
                name: self.names.intern(&param.name),
                ty: self.intern_expr(&param.ty, &referenced_from)?,
                mode: param.mode,
            });
        }
        let id = MethodId(self.methods.len() as u32);
        if method.is_entry {
            if let Some(first) = self.entry {
                return Err(Error::DuplicateEntryPoint {
                    first: self.display_method(first),
                    second: referenced_from,
                });
            }
            self.entry = Some(id);
        }
        self.methods.push(MethodDef {
            id,
            owner,
            name: self.names.intern(&method.name),
            type_params: method.type_params.iter().map(|p| self.names.intern(p)).collect(),
            ret,
            params,
            is_static: method.is_static,
            is_virtual: method.is_virtual,
            is_abstract: method.is_abstract,
            is_entry: method.is_entry,
            is_extern: method.is_extern,
            body: method.body.map(BodyHandle),
        });
        Ok(id)
    }

    /// Interns a spelled type reference, failing with the referencing
    /// symbol's identity when a named definition is absent from the graph.
    pub fn intern_expr(&mut self, expr: &TypeExpr, referenced_from: &str) -> Result<TypeId, Error> {
        match expr {
            TypeExpr::Named { qualified, args } => {
                let key = self.parse_key(qualified, args.len() as u8);
                let def = self.by_key.get(&key).copied().ok_or_else(|| {
                    let mut name = qualified.clone();
                    if !args.is_empty() {
                        name.push('`');
                        name.push_str(&args.len().to_string());
                    }
                    Error::SymbolNotFound {
                        name,
                        referenced_from: referenced_from.to_string(),
                    }
                })?;
                let mut resolved = TypeIdVec::new();
                for arg in args {
                    resolved.push(self.intern_expr(arg, referenced_from)?);
                }
                Ok(self.arena.named(def, resolved))
            }
            TypeExpr::Array { element, rank } => {
                let element = self.intern_expr(element, referenced_from)?;
                Ok(self.arena.array(element, *rank))
            }
            TypeExpr::Pointer { pointee } => {
                let pointee = self.intern_expr(pointee, referenced_from)?;
                Ok(self.arena.pointer(pointee))
            }
            TypeExpr::Param { name } => {
                let name = self.names.intern(name);
                Ok(self.arena.param(name))
            }
        }
    }

    fn parse_key(&mut self, qualified: &str, arity: u8) -> TypeKey {
        let (namespace, name) = match qualified.rsplit_once('.') {
            Some((ns, name)) => (ns, name),
            None => ("", qualified),
        };
        TypeKey {
            namespace: self.names.namespace(namespace),
            name: self.names.intern(name),
            arity,
        }
    }

    pub fn assembly(&self) -> &AssemblyIdentity {
        &self.assembly
    }

    pub fn entry(&self) -> Option<MethodId> {
        self.entry
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn type_def(&self, id: TypeDefId) -> &TypeDef {
        &self.types[id.index()]
    }

    pub fn method_def(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    pub fn field_def(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    pub fn types_iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    pub fn type_by_key(&self, key: TypeKey) -> Option<TypeDefId> {
        self.by_key.get(&key).copied()
    }

    /// Read-only lookup by qualified name; never interns, so unknown names
    /// simply return `None`.
    pub fn find_type(&self, qualified: &str, arity: u8) -> Option<TypeDefId> {
        let (namespace, name) = match qualified.rsplit_once('.') {
            Some((ns, name)) => (ns, name),
            None => ("", qualified),
        };
        let namespace = if namespace.is_empty() {
            self.names.root_namespace()
        } else {
            // Every segment must already be interned for the chain to exist.
            let mut segments = Vec::new();
            for segment in namespace.split('.') {
                segments.push(self.names.name_id_if_known(segment)?);
            }
            self.names.namespace_id_if_known(&segments)?
        };
        let name = self.names.name_id_if_known(name)?;
        self.by_key
            .get(&TypeKey {
                namespace,
                name,
                arity,
            })
            .copied()
    }

    /// Declaration-dependency depth: one more than the deepest base or
    /// implemented interface. Full declarations ordered by this depth see
    /// every base class and every wrapped interface complete before the
    /// types that need them.
    pub fn base_depth(&self, def: TypeDefId) -> usize {
        let mut visiting = FxHashSet::default();
        self.base_depth_inner(def, &mut visiting)
    }

    fn base_depth_inner(&self, def: TypeDefId, visiting: &mut FxHashSet<TypeDefId>) -> usize {
        if !visiting.insert(def) {
            return 0;
        }
        let ty = self.type_def(def);
        let mut depth = 0;
        for parent in ty.base.iter().chain(ty.interfaces.iter()) {
            if let Ty::Named { def: parent_def, .. } = self.arena.get(*parent) {
                depth = depth.max(1 + self.base_depth_inner(parent_def, visiting));
            }
        }
        visiting.remove(&def);
        depth
    }

    /// A value type is atomic when no instance field can hold a managed
    /// pointer, so the collector never needs to scan it.
    pub fn is_atomic(&self, def: TypeDefId) -> bool {
        let mut seen = FxHashSet::default();
        self.is_atomic_inner(def, &mut seen)
    }

    fn is_atomic_inner(&self, def: TypeDefId, seen: &mut FxHashSet<TypeDefId>) -> bool {
        if !seen.insert(def) {
            return true;
        }
        let ty = self.type_def(def);
        match ty.kind {
            TypeDefKind::Enum => return true,
            TypeDefKind::Value => {}
            _ => return false,
        }
        if ty.special.map(Special::is_numeric).unwrap_or(false) {
            return true;
        }
        ty.fields.iter().all(|field| {
            let field = self.field_def(*field);
            if field.is_static {
                return true;
            }
            match self.arena.get(field.ty) {
                Ty::Named { def, args } => args.is_empty() && self.is_atomic_inner(def, seen),
                Ty::Pointer { .. } | Ty::Array { .. } | Ty::Param { .. } => false,
            }
        })
    }

    /// Managed-style rendering of a term, for diagnostics and logs.
    pub fn display_ty(&self, id: TypeId) -> String {
        match self.arena.get(id) {
            Ty::Named { def, args } => {
                let mut out = self.names.type_key_display(self.type_def(def).key);
                if !args.is_empty() {
                    out.push('<');
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.display_ty(*arg));
                    }
                    out.push('>');
                }
                out
            }
            Ty::Array { element, rank } => {
                let mut out = self.display_ty(element);
                out.push('[');
                for _ in 1..rank {
                    out.push(',');
                }
                out.push(']');
                out
            }
            Ty::Pointer { pointee } => format!("{}*", self.display_ty(pointee)),
            Ty::Param { name } => self.names.resolve(name).to_string(),
        }
    }

    pub fn display_method(&self, id: MethodId) -> String {
        let method = self.method_def(id);
        format!(
            "{}.{}",
            self.names.type_key_display(self.type_def(method.owner).key),
            self.names.resolve(method.name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::FrontendProvider;

    fn graph_from_json(json: &str) -> SymbolGraph {
        let provider = FrontendProvider::from_json("test.json", json).unwrap();
        SymbolGraph::ingest(&provider, &[]).unwrap()
    }

    fn corelib_and(types_json: &str) -> String {
        format!(
            r#"{{
                "assembly": {{ "name": "Demo" }},
                "types": [
                    {{ "name": "Object", "namespace": "System", "kind": "Reference" }},
                    {{ "name": "ValueType", "namespace": "System", "kind": "Reference",
                       "base": {{ "Named": {{ "qualified": "System.Object" }} }} }},
                    {{ "name": "Int32", "namespace": "System", "kind": "Value",
                       "base": {{ "Named": {{ "qualified": "System.ValueType" }} }} }}
                    {}
                ]
            }}"#,
            types_json
        )
    }

    #[test]
    fn ingest_builds_keys_and_terms() {
        let graph = graph_from_json(&corelib_and(
            r#", { "name": "Holder", "namespace": "Demo", "kind": "Reference",
                   "type_params": ["T"],
                   "base": { "Named": { "qualified": "System.Object" } },
                   "fields": [ { "name": "item", "ty": { "Param": { "name": "T" } } } ] }"#,
        ));
        let holder = graph.find_type("Demo.Holder", 1).expect("Holder declared");
        let def = graph.type_def(holder);
        assert!(def.is_generic());
        assert_eq!(def.fields.len(), 1);
        let field = graph.field_def(def.fields[0]);
        assert!(graph.arena.get(field.ty).is_param());
    }

    #[test]
    fn missing_reference_is_symbol_not_found() {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [ { "name": "A", "namespace": "Demo", "kind": "Reference",
                              "base": { "Named": { "qualified": "Demo.Missing" } } } ] }"#,
        )
        .unwrap();
        let err = SymbolGraph::ingest(&provider, &[]).unwrap_err();
        match err {
            Error::SymbolNotFound { name, referenced_from } => {
                assert_eq!(name, "Demo.Missing");
                assert_eq!(referenced_from, "Demo.A");
            }
            other => panic!("expected SymbolNotFound, got {other}"),
        }
    }

    #[test]
    fn duplicate_entry_points_are_fatal() {
        let json = corelib_and(
            r#", { "name": "Void", "namespace": "System", "kind": "Value" },
               { "name": "A", "namespace": "Demo", "kind": "Reference",
                 "methods": [ { "name": "Main", "ret": { "Named": { "qualified": "System.Void" } },
                                "is_static": true, "is_entry": true } ] },
               { "name": "B", "namespace": "Demo", "kind": "Reference",
                 "methods": [ { "name": "Main", "ret": { "Named": { "qualified": "System.Void" } },
                                "is_static": true, "is_entry": true } ] }"#,
        );
        let provider = FrontendProvider::from_json("test.json", &json).unwrap();
        let err = SymbolGraph::ingest(&provider, &[]).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntryPoint { .. }));
    }

    #[test]
    fn cross_assembly_references_resolve_in_any_order() {
        let corelib = FrontendProvider::from_json(
            "corelib.json",
            r#"{ "assembly": { "name": "CoreLib" },
                 "types": [ { "name": "Object", "namespace": "System", "kind": "Reference" } ] }"#,
        )
        .unwrap();
        let app = FrontendProvider::from_json(
            "app.json",
            r#"{ "assembly": { "name": "App", "references": ["CoreLib"] },
                 "types": [ { "name": "Widget", "namespace": "App", "kind": "Reference",
                              "base": { "Named": { "qualified": "System.Object" } } } ] }"#,
        )
        .unwrap();
        let graph = SymbolGraph::ingest(&app, &[&corelib]).unwrap();
        let widget = graph.find_type("App.Widget", 0).unwrap();
        assert!(graph.type_def(widget).base.is_some());
        let object = graph.find_type("System.Object", 0).unwrap();
        assert!(graph.type_def(object).is_external);
    }

    #[test]
    fn base_depth_counts_the_chain() {
        let graph = graph_from_json(&corelib_and(""));
        let int32 = graph.find_type("System.Int32", 0).unwrap();
        assert_eq!(graph.base_depth(int32), 2);
        let object = graph.find_type("System.Object", 0).unwrap();
        assert_eq!(graph.base_depth(object), 0);
    }

    #[test]
    fn primitives_and_enums_are_atomic() {
        let graph = graph_from_json(&corelib_and(
            r#", { "name": "Color", "namespace": "Demo", "kind": "Enum",
                   "underlying": { "Named": { "qualified": "System.Int32" } } },
               { "name": "Point", "namespace": "Demo", "kind": "Value",
                 "fields": [ { "name": "x", "ty": { "Named": { "qualified": "System.Int32" } } },
                             { "name": "y", "ty": { "Named": { "qualified": "System.Int32" } } } ] },
               { "name": "Node", "namespace": "Demo", "kind": "Value",
                 "fields": [ { "name": "next", "ty": { "Pointer": { "pointee": { "Named": { "qualified": "Demo.Point" } } } } } ] }"#,
        ));
        assert!(graph.is_atomic(graph.find_type("System.Int32", 0).unwrap()));
        assert!(graph.is_atomic(graph.find_type("Demo.Color", 0).unwrap()));
        assert!(graph.is_atomic(graph.find_type("Demo.Point", 0).unwrap()));
        assert!(!graph.is_atomic(graph.find_type("Demo.Node", 0).unwrap()));
    }

    #[test]
    fn display_renders_constructed_terms() {
        let mut graph = graph_from_json(&corelib_and(
            r#", { "name": "List", "namespace": "Demo", "kind": "Reference", "type_params": ["T"] }"#,
        ));
        let expr = TypeExpr::array(
            TypeExpr::named_with("Demo.List", vec![TypeExpr::named("System.Int32")]),
            1,
        );
        let ty = graph.intern_expr(&expr, "test").unwrap();
        assert_eq!(graph.display_ty(ty), "Demo.List<System.Int32>[]");
    }
}
