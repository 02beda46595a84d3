// src/units.rs
//
// Declaration model: one TranslationUnit per declared type, carrying the
// ordered member declarations the emitter will render. Units are built
// once per pass, in deterministic order (base depth, then name), so a
// base's full declaration always precedes its derived types'.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::{Ty, TypeId};
use crate::identity::NameId;
use crate::store::{FieldId, MethodId, SymbolGraph, TypeDef, TypeDefId, TypeDefKind};

#[derive(Debug, Clone)]
pub enum Declaration {
    Method {
        method: MethodId,
        /// No body is available and the method is neither abstract nor
        /// extern, so a stub definition goes to the impl tree.
        is_stub: bool,
        /// The owner or the method itself is generic; definitions route to
        /// the template-header pass.
        is_generic: bool,
    },
    Field(FieldId),
    /// A nested type forward-declared alongside its owner.
    NestedTypeForward(TypeDefId),
    /// One dispatch wrapper per implemented interface.
    InterfaceWrapper(TypeId),
    /// `using base::name;` re-exposing base overloads hidden by a
    /// same-name declaration in this type.
    BaseUsing(NameId),
}

#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub def: TypeDefId,
    pub declarations: Vec<Declaration>,
    pub is_generic: bool,
    pub entry_method: Option<MethodId>,
    /// Nested types are forward-declared by their owner's unit.
    pub forwarded_by_owner: bool,
}

impl TranslationUnit {
    pub fn has_stub_declarations(&self) -> bool {
        self.declarations
            .iter()
            .any(|d| matches!(d, Declaration::Method { is_stub: true, .. }))
    }

    pub fn has_generic_declarations(&self) -> bool {
        self.declarations
            .iter()
            .any(|d| matches!(d, Declaration::Method { is_generic: true, .. }))
    }
}

/// Builds units for every non-external type, ordered by base depth then
/// name so dependencies come first in the full-declaration pass.
pub fn build_units(graph: &SymbolGraph) -> Vec<TranslationUnit> {
    let mut nested_children: FxHashMap<TypeDefId, Vec<TypeDefId>> = FxHashMap::default();
    for def in graph.types_iter().filter(|d| !d.is_external) {
        if let Some(owner) = containing_def(graph, def) {
            nested_children.entry(owner).or_default().push(def.id);
        }
    }

    let mut units: Vec<TranslationUnit> = graph
        .types_iter()
        .filter(|d| !d.is_external)
        .map(|def| build_unit(graph, def, nested_children.get(&def.id)))
        .collect();

    units.sort_by_cached_key(|unit| {
        (
            graph.base_depth(unit.def),
            graph.names.type_key_display(graph.type_def(unit.def).key),
        )
    });
    units
}

fn build_unit(
    graph: &SymbolGraph,
    def: &TypeDef,
    children: Option<&Vec<TypeDefId>>,
) -> TranslationUnit {
    let mut declarations = Vec::new();

    for child in children.into_iter().flatten() {
        declarations.push(Declaration::NestedTypeForward(*child));
    }

    for name in hidden_base_overloads(graph, def) {
        declarations.push(Declaration::BaseUsing(name));
    }

    for field in &def.fields {
        // Enum constants are part of the enum body, not the holder struct.
        if def.kind == TypeDefKind::Enum && graph.field_def(*field).const_value.is_some() {
            continue;
        }
        declarations.push(Declaration::Field(*field));
    }

    for method in &def.methods {
        let m = graph.method_def(*method);
        declarations.push(Declaration::Method {
            method: *method,
            is_stub: m.body.is_none() && !m.is_abstract && !m.is_extern,
            is_generic: def.is_generic() || m.is_generic(),
        });
    }

    for iface in &def.interfaces {
        declarations.push(Declaration::InterfaceWrapper(*iface));
    }

    TranslationUnit {
        def: def.id,
        declarations,
        is_generic: def.is_generic(),
        entry_method: def
            .methods
            .iter()
            .copied()
            .find(|m| graph.method_def(*m).is_entry),
        forwarded_by_owner: containing_def(graph, def).is_some(),
    }
}

/// Owner definition of a nested type (`Outer+Inner` is owned by `Outer` in
/// the same namespace), when that owner is part of the graph.
fn containing_def(graph: &SymbolGraph, def: &TypeDef) -> Option<TypeDefId> {
    let name = graph.names.resolve(def.key.name);
    let (outer, _) = name.rsplit_once('+')?;
    let outer = graph.names.name_id_if_known(outer)?;
    // Nested type owners are looked up at arity 0; generic owners keep
    // their parameters on the nested type's own list in the input model.
    graph.type_by_key(crate::identity::TypeKey {
        namespace: def.key.namespace,
        name: outer,
        arity: 0,
    })
}

/// Names declared by this type that also exist on the base chain. A
/// derived declaration hides every base overload of the same name, so each
/// of these needs a `using base::name;` re-exposure.
fn hidden_base_overloads(graph: &SymbolGraph, def: &TypeDef) -> Vec<NameId> {
    let own: FxHashSet<NameId> = def
        .methods
        .iter()
        .map(|m| graph.method_def(*m).name)
        .collect();
    if own.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    let mut current = def.base;
    let mut hops = 0;
    while let Some(base_ty) = current {
        if hops > graph.type_count() {
            break;
        }
        hops += 1;
        let base_def = match graph.arena.get(base_ty) {
            Ty::Named { def, .. } => def,
            _ => break,
        };
        let base = graph.type_def(base_def);
        for method in &base.methods {
            let name = graph.method_def(*method).name;
            if own.contains(&name) && seen.insert(name) {
                out.push(name);
            }
        }
        current = base.base;
    }
    out
}
