// src/emit/iface.rs
//
// Interface dispatch wrappers. A type implementing an interface gets one
// nested wrapper class per interface: the wrapper inherits the interface,
// holds a back pointer to the implementor, and overrides every dispatch
// method (its own and those of every base interface) by forwarding. A
// conversion operator on the implementor hands out the wrapper, so an
// interface-typed use site never sees the implementing class directly.

use rustc_hash::FxHashSet;

use crate::arena::{Ty, TypeId};
use crate::identity::{clean_name, NameId};
use crate::resolve::{ResolvedSignature, Resolver};
use crate::store::{MethodDef, MethodId, SymbolGraph, TypeDef};

use super::writer::CxxWriter;
use super::{is_void, method_native_name, spell_type, write_method_header, write_template_head, Spell};

/// Where the wrapper method definitions land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperVariant {
    /// Out-of-line definitions in the unit's source file.
    Source,
    /// Definitions in the template header, prefixed with the owner's
    /// template head.
    TemplateHeader,
}

pub(crate) fn wrapper_class_name(graph: &SymbolGraph, iface_ty: TypeId) -> String {
    format!("__iface_{}", clean_name(&spell_type(graph, iface_ty, Spell::Bare)))
}

fn wrapper_field_name(graph: &SymbolGraph, iface_ty: TypeId) -> String {
    format!("__wrap_{}", clean_name(&spell_type(graph, iface_ty, Spell::Bare)))
}

/// Every instance method the wrapper must forward: base interfaces first,
/// then the interface itself, deduplicated by name and resolved parameter
/// types so diamond re-declarations collapse while same-arity overloads
/// survive. Signatures come back resolved in each interface's own
/// instantiation.
pub(crate) fn collect_dispatch_methods(
    graph: &SymbolGraph,
    resolver: &Resolver,
    iface_ty: TypeId,
) -> Vec<(MethodId, ResolvedSignature)> {
    let mut seen_types = FxHashSet::default();
    let mut seen_members: FxHashSet<(NameId, Vec<TypeId>)> = FxHashSet::default();
    let mut out = Vec::new();
    collect_inner(
        graph,
        resolver,
        iface_ty,
        &mut seen_types,
        &mut seen_members,
        &mut out,
    );
    out
}

fn collect_inner(
    graph: &SymbolGraph,
    resolver: &Resolver,
    iface_ty: TypeId,
    seen_types: &mut FxHashSet<TypeId>,
    seen_members: &mut FxHashSet<(NameId, Vec<TypeId>)>,
    out: &mut Vec<(MethodId, ResolvedSignature)>,
) {
    if !seen_types.insert(iface_ty) {
        return;
    }
    let Ty::Named { def, .. } = graph.arena.get(iface_ty) else {
        return;
    };
    for parent in resolver.interfaces_of(iface_ty) {
        collect_inner(graph, resolver, parent, seen_types, seen_members, out);
    }
    let ctx = resolver.context_for(iface_ty, None);
    for method in &graph.type_def(def).methods {
        let method = graph.method_def(*method);
        if method.is_static {
            continue;
        }
        let signature = resolver.resolve_signature(method.id, &ctx);
        let key = (
            method.name,
            signature.params.iter().map(|p| p.ty).collect::<Vec<_>>(),
        );
        if !seen_members.insert(key) {
            continue;
        }
        out.push((method.id, signature));
    }
}

/// True when the wrapper for `iface_ty` carries generic members. Such a
/// wrapper needs a template header even when its owner is closed.
pub(crate) fn has_generic_dispatch_members(
    graph: &SymbolGraph,
    resolver: &Resolver,
    iface_ty: TypeId,
) -> bool {
    collect_dispatch_methods(graph, resolver, iface_ty)
        .iter()
        .any(|(method, _)| graph.method_def(*method).is_generic())
}

/// A member's definition lands in the source variant only when nothing
/// about it is templated; the template-header variant takes members whose
/// owner or whose own parameter list is generic.
fn member_in_variant(owner: &TypeDef, method: &MethodDef, variant: WrapperVariant) -> bool {
    match variant {
        WrapperVariant::Source => !method.is_generic(),
        WrapperVariant::TemplateHeader => owner.is_generic() || method.is_generic(),
    }
}

/// The in-class part: wrapper class, its instance, and the conversion
/// operator wiring the back pointer on the way out.
pub(crate) fn write_wrapper_declaration(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    resolver: &Resolver,
    owner: &TypeDef,
    iface_ty: TypeId,
) {
    let iface_bare = spell_type(graph, iface_ty, Spell::Bare);
    let class_name = wrapper_class_name(graph, iface_ty);
    let field_name = wrapper_field_name(graph, iface_ty);
    let owner_bare = spell_type(graph, owner.self_ty, Spell::Bare);

    w.emit_line(&format!("class {class_name} : public {iface_bare}"));
    w.emit_line("{");
    w.emit_line("public:");
    w.indent();
    w.emit_line(&format!("{owner_bare}* __this;"));
    for (method, signature) in collect_dispatch_methods(graph, resolver, iface_ty) {
        let method = graph.method_def(method);
        if method.is_generic() {
            // No virtual templates in the target; generic members forward
            // non-virtually under their own head.
            write_template_head(w, graph, &method.type_params);
            write_method_header(w, graph, method, &signature, None, false);
            w.emit(";");
        } else {
            w.emit("virtual ");
            write_method_header(w, graph, method, &signature, None, false);
            w.emit(" override;");
        }
        w.end_line();
    }
    w.dedent();
    w.emit_line("};");
    w.emit_line(&format!("{class_name} {field_name};"));
    w.emit_line(&format!("operator {iface_bare}*()"));
    w.emit_line("{");
    w.indent();
    w.emit_line(&format!("{field_name}.__this = this;"));
    w.emit_line(&format!("return &{field_name};"));
    w.dedent();
    w.emit_line("}");
}

/// Out-of-line wrapper method definitions, each forwarding through the
/// back pointer. Each variant takes only the members that belong to it,
/// so a member is defined exactly once across the two passes.
pub(crate) fn write_wrapper_implementations(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    resolver: &Resolver,
    owner: &TypeDef,
    iface_ty: TypeId,
    variant: WrapperVariant,
) {
    let owner_bare = spell_type(graph, owner.self_ty, Spell::Bare);
    let class_name = wrapper_class_name(graph, iface_ty);
    for (method, signature) in collect_dispatch_methods(graph, resolver, iface_ty) {
        let method = graph.method_def(method);
        if !member_in_variant(owner, method, variant) {
            continue;
        }
        if owner.is_generic() {
            write_template_head(w, graph, &owner.type_params);
        }
        if method.is_generic() {
            write_template_head(w, graph, &method.type_params);
        }
        let qualify = format!("{owner_bare}::{class_name}");
        write_method_header(w, graph, method, &signature, Some(&qualify), false);
        w.end_line();
        w.emit_line("{");
        w.indent();
        let args = signature
            .params
            .iter()
            .map(|p| clean_name(graph.names.resolve(p.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!("__this->{}({})", method_native_name(graph, method), args);
        if is_void(graph, signature.ret) {
            w.emit_line(&format!("{call};"));
        } else {
            w.emit_line(&format!("return {call};"));
        }
        w.dedent();
        w.emit_line("}");
        w.blank_line();
    }
}
