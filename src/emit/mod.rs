// src/emit/mod.rs
//
// Native declaration synthesis. This module owns the spelling rules that
// map resolved terms to C++ type syntax; the submodules each produce one
// artifact kind (forward/full declarations, wrappers, template headers,
// per-unit sources, the aggregate header, the entry point, build files).

mod build_files;
mod decl;
mod entry;
mod header;
mod iface;
mod source;
mod templates;
pub mod writer;

pub use build_files::{write_build_files, BuildPlan};
pub use decl::{write_forward_declaration, write_full_declaration};
pub use header::{write_assembly_header, HeaderPlan};
pub use iface::WrapperVariant;
pub use source::{write_stub_source, write_unit_source};
pub use templates::{needs_template_header, write_template_header, write_template_stub_header};

use crate::arena::{Ty, TypeId};
use crate::identity::{clean_name, NameId, NamespaceId};
use crate::store::{MethodDef, SigParam, Special, SymbolGraph, TypeDef, TypeDefKind};
use crate::symbols::ParamMode;
use writer::CxxWriter;

/// How a named type should be spelled at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Spell {
    /// Usage position: reference kinds gain `*`, well-known types use
    /// their native spellings (`int32_t`, `string*`).
    Usage,
    /// Declaration-target position (base clauses, typedefs, template
    /// specializations): the bare qualified class name.
    Bare,
}

pub(crate) fn special_keyword(special: Special) -> Option<&'static str> {
    Some(match special {
        Special::Void => "void",
        Special::Bool => "bool",
        Special::Char => "char16_t",
        Special::I8 => "int8_t",
        Special::U8 => "uint8_t",
        Special::I16 => "int16_t",
        Special::U16 => "uint16_t",
        Special::I32 => "int32_t",
        Special::U32 => "uint32_t",
        Special::I64 => "int64_t",
        Special::U64 => "uint64_t",
        Special::F32 => "float",
        Special::F64 => "double",
        Special::IntPtr => "intptr_t",
        Special::UIntPtr => "uintptr_t",
        Special::Object | Special::String => return None,
    })
}

/// Native identifier of a type: nested chains joined with `_`, then the
/// standard character cleaning.
pub(crate) fn native_type_name(graph: &SymbolGraph, def: &TypeDef) -> String {
    clean_name(&graph.names.resolve(def.key.name).replace('+', "_"))
}

/// The `enum class` spelled form of an enum definition. The holder struct
/// keeps the plain name; the underlying constant enum gets this one.
pub(crate) fn enum_native_name(graph: &SymbolGraph, def: &TypeDef) -> String {
    format!("__enum_{}", native_type_name(graph, def))
}

pub(crate) fn namespace_parts(graph: &SymbolGraph, namespace: NamespaceId) -> Vec<String> {
    graph
        .names
        .namespace_segments(namespace)
        .iter()
        .map(|segment| clean_name(graph.names.resolve(*segment)))
        .collect()
}

pub(crate) fn qualified_type_name(graph: &SymbolGraph, def: &TypeDef) -> String {
    let mut parts = namespace_parts(graph, def.key.namespace);
    parts.push(native_type_name(graph, def));
    parts.join("::")
}

pub(crate) fn qualified_enum_name(graph: &SymbolGraph, def: &TypeDef) -> String {
    let mut parts = namespace_parts(graph, def.key.namespace);
    parts.push(enum_native_name(graph, def));
    parts.join("::")
}

/// Spelling used on the value side of the valuetype/class trait pair:
/// native keywords for primitives and void, the `enum class` form for
/// enums, the qualified struct name otherwise.
pub(crate) fn spell_value_form(graph: &SymbolGraph, def: &TypeDef) -> String {
    if let Some(special) = def.special {
        if let Some(keyword) = special_keyword(special) {
            return keyword.to_string();
        }
    }
    if def.kind == TypeDefKind::Enum {
        return qualified_enum_name(graph, def);
    }
    qualified_type_name(graph, def)
}

pub(crate) fn spell_type(graph: &SymbolGraph, ty: TypeId, spell: Spell) -> String {
    match graph.arena.get(ty) {
        Ty::Named { def, args } => {
            let td = graph.type_def(def);
            if args.is_empty() {
                if let Some(special) = td.special {
                    match special {
                        Special::Object if spell == Spell::Usage => return "object*".to_string(),
                        Special::String if spell == Spell::Usage => return "string*".to_string(),
                        Special::Object | Special::String => {}
                        other => {
                            if let Some(keyword) = special_keyword(other) {
                                return keyword.to_string();
                            }
                        }
                    }
                }
            }
            let mut out = qualified_type_name(graph, td);
            if !args.is_empty() {
                out.push('<');
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&spell_type(graph, *arg, Spell::Usage));
                }
                out.push('>');
            }
            if spell == Spell::Usage
                && matches!(
                    td.kind,
                    TypeDefKind::Reference | TypeDefKind::Interface | TypeDefKind::Delegate
                )
            {
                out.push('*');
            }
            out
        }
        Ty::Array { element, rank } => {
            let element = spell_type(graph, element, Spell::Usage);
            let spelled = if rank <= 1 {
                format!("__array<{element}>")
            } else {
                format!("__array<{element}, {rank}>")
            };
            match spell {
                Spell::Usage => format!("{spelled}*"),
                Spell::Bare => spelled,
            }
        }
        Ty::Pointer { pointee } => format!("{}*", spell_type(graph, pointee, Spell::Usage)),
        Ty::Param { name } => clean_name(graph.names.resolve(name)),
    }
}

pub(crate) fn method_native_name(graph: &SymbolGraph, method: &MethodDef) -> String {
    clean_name(graph.names.resolve(method.name))
}

pub(crate) fn is_void(graph: &SymbolGraph, ty: TypeId) -> bool {
    matches!(
        graph.arena.get(ty),
        Ty::Named { def, .. } if graph.type_def(def).special == Some(Special::Void)
    )
}

pub(crate) fn spell_param(graph: &SymbolGraph, param: &SigParam) -> String {
    let ty = spell_type(graph, param.ty, Spell::Usage);
    let name = clean_name(graph.names.resolve(param.name));
    match param.mode {
        ParamMode::Value => format!("{ty} {name}"),
        ParamMode::Ref | ParamMode::Out => format!("{ty}& {name}"),
        ParamMode::In => format!("const {ty}& {name}"),
    }
}

pub(crate) fn write_template_head(w: &mut CxxWriter, graph: &SymbolGraph, params: &[NameId]) {
    w.emit("template <");
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            w.emit(", ");
        }
        w.emit("typename ");
        w.emit(&clean_name(graph.names.resolve(*param)));
    }
    w.emit(">");
    w.end_line();
}

/// Return type, optional owner qualification, name, parameter list. The
/// caller decides block vs `;` termination and any template head.
pub(crate) fn write_method_header(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    method: &MethodDef,
    signature: &crate::resolve::ResolvedSignature,
    qualify_owner: Option<&str>,
    in_class: bool,
) {
    if in_class && method.is_static {
        w.emit("static ");
    }
    if in_class && (method.is_virtual || method.is_abstract) {
        w.emit("virtual ");
    }
    w.emit(&spell_type(graph, signature.ret, Spell::Usage));
    w.emit(" ");
    if let Some(owner) = qualify_owner {
        w.emit(owner);
        w.emit("::");
    }
    w.emit(&method_native_name(graph, method));
    w.emit("(");
    for (idx, param) in signature.params.iter().enumerate() {
        if idx > 0 {
            w.emit(", ");
        }
        w.emit(&spell_param(graph, param));
    }
    w.emit(")");
}

/// Namespace blocks opened inline, matching the single-line forward style:
/// `namespace A { namespace B {`.
pub(crate) fn write_namespace_open(w: &mut CxxWriter, parts: &[String]) {
    if parts.is_empty() {
        return;
    }
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            w.emit(" ");
        }
        w.emit("namespace ");
        w.emit(part);
        w.emit(" {");
    }
    w.end_line();
    w.indent();
}

pub(crate) fn write_namespace_close(w: &mut CxxWriter, parts: &[String]) {
    if parts.is_empty() {
        return;
    }
    w.dedent();
    for idx in 0..parts.len() {
        if idx > 0 {
            w.emit(" ");
        }
        w.emit("}");
    }
    w.end_line();
}
