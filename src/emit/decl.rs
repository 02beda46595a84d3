// src/emit/decl.rs
//
// Forward and full declarations for one translation unit. Forwards are
// compact single-line records (with enum constant lists expanded in
// place); full declarations carry the record body, and value layouts are
// followed by the boxing trait pair and the collector hint.

use crate::identity::clean_name;
use crate::resolve::{GenericContext, Resolver};
use crate::store::{FieldId, Special, SymbolGraph, TypeDef, TypeDefKind};
use crate::units::{Declaration, TranslationUnit};

use super::iface;
use super::writer::CxxWriter;
use super::{
    enum_native_name, namespace_parts, native_type_name, qualified_type_name, special_keyword,
    spell_type, spell_value_form, write_method_header, write_namespace_close, write_namespace_open,
    write_template_head, Spell,
};

fn record_keyword(kind: TypeDefKind) -> &'static str {
    if kind.is_value_layout() {
        "struct"
    } else {
        "class"
    }
}

/// Compact forward declaration for a unit, plus forwards for the nested
/// types it owns. Enums expand their constant list here so values are
/// usable before any full declaration; the well-known root types also get
/// their lowercase aliases.
pub fn write_forward_declaration(w: &mut CxxWriter, graph: &SymbolGraph, unit: &TranslationUnit) {
    let def = graph.type_def(unit.def);
    let parts = namespace_parts(graph, def.key.namespace);
    for part in &parts {
        w.emit("namespace ");
        w.emit(part);
        w.emit(" { ");
    }
    forward_one(w, graph, def);
    for decl in &unit.declarations {
        if let Declaration::NestedTypeForward(nested) = decl {
            forward_one(w, graph, graph.type_def(*nested));
        }
    }
    for idx in 0..parts.len() {
        if idx > 0 {
            w.emit(" ");
        }
        w.emit("}");
    }
    w.end_line();
    match def.special {
        Some(Special::Object) => {
            w.emit_line(&format!("typedef {} object;", qualified_type_name(graph, def)));
        }
        Some(Special::String) => {
            w.emit_line(&format!("typedef {} string;", qualified_type_name(graph, def)));
        }
        _ => {}
    }
}

fn forward_one(w: &mut CxxWriter, graph: &SymbolGraph, def: &TypeDef) {
    if def.kind == TypeDefKind::Enum {
        write_enum_values(w, graph, def);
        w.emit("struct ");
        w.emit(&native_type_name(graph, def));
        w.emit("; ");
        return;
    }
    if def.is_generic() {
        w.emit("template <");
        for (idx, param) in def.type_params.iter().enumerate() {
            if idx > 0 {
                w.emit(", ");
            }
            w.emit("typename ");
            w.emit(&clean_name(graph.names.resolve(*param)));
        }
        w.emit("> ");
    }
    w.emit(record_keyword(def.kind));
    w.emit(" ");
    w.emit(&native_type_name(graph, def));
    w.emit("; ");
}

fn write_enum_values(w: &mut CxxWriter, graph: &SymbolGraph, def: &TypeDef) {
    w.emit("enum class ");
    w.emit(&enum_native_name(graph, def));
    w.emit(" : ");
    let underlying = def
        .underlying
        .map(|ty| spell_type(graph, ty, Spell::Usage))
        .unwrap_or_else(|| "int32_t".to_string());
    w.emit(&underlying);
    w.emit(" {");
    let mut first = true;
    for field in &def.fields {
        let field = graph.field_def(*field);
        let Some(value) = field.const_value else {
            continue;
        };
        if first {
            w.emit(" ");
            first = false;
        } else {
            w.emit(", ");
        }
        w.emit("c_");
        w.emit(&clean_name(graph.names.resolve(field.name)));
        w.emit(" = ");
        w.emit(&value.to_string());
    }
    w.emit(" }; ");
}

/// Full declaration for one unit: the extern linkage block, the record
/// with base clause, members and interface wrappers, then the trait
/// wiring that follows value layouts.
pub fn write_full_declaration(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    resolver: &Resolver,
    unit: &TranslationUnit,
) {
    let def = graph.type_def(unit.def);
    let parts = namespace_parts(graph, def.key.namespace);
    write_namespace_open(w, &parts);

    write_extern_linkage(w, graph, resolver, def);

    if def.is_generic() {
        write_template_head(w, graph, &def.type_params);
    }
    w.emit(record_keyword(def.kind));
    w.emit(" ");
    w.emit(&native_type_name(graph, def));
    if let Some(base) = def.base {
        w.emit(" : public ");
        w.emit(&spell_type(graph, base, Spell::Bare));
    }
    w.end_line();
    w.emit_line("{");
    w.emit_line("public:");
    w.indent();

    if let Some(base) = def.base {
        w.emit_line(&format!("typedef {} base;", spell_type(graph, base, Spell::Bare)));
    }

    if def.kind == TypeDefKind::Enum {
        write_enum_holder_members(w, graph, def);
    }

    let ctx = GenericContext::empty();
    for decl in &unit.declarations {
        match decl {
            Declaration::NestedTypeForward(_) => {}
            Declaration::BaseUsing(name) => {
                w.emit_line(&format!("using base::{};", clean_name(graph.names.resolve(*name))));
            }
            Declaration::Field(field) => write_field(w, graph, *field),
            Declaration::Method { method, .. } => {
                let method = graph.method_def(*method);
                let signature = resolver.resolve_signature(method.id, &ctx);
                if method.is_generic() {
                    write_template_head(w, graph, &method.type_params);
                }
                write_method_header(w, graph, method, &signature, None, true);
                if method.is_abstract {
                    w.emit(" = 0");
                }
                w.emit(";");
                w.end_line();
            }
            Declaration::InterfaceWrapper(iface_ty) => {
                iface::write_wrapper_declaration(w, graph, resolver, def, *iface_ty);
            }
        }
    }

    w.dedent();
    w.emit_line("};");
    write_namespace_close(w, &parts);

    if !def.is_generic() {
        write_value_trait_wiring(w, graph, def);
        write_collector_hint(w, graph, def);
    }
}

fn write_extern_linkage(w: &mut CxxWriter, graph: &SymbolGraph, resolver: &Resolver, def: &TypeDef) {
    let externs: Vec<_> = def
        .methods
        .iter()
        .map(|m| graph.method_def(*m))
        .filter(|m| m.is_extern)
        .collect();
    if externs.is_empty() {
        return;
    }
    let ctx = GenericContext::empty();
    w.emit_line("extern \"C\"");
    w.emit_line("{");
    w.indent();
    for method in externs {
        let signature = resolver.resolve_signature(method.id, &ctx);
        write_method_header(w, graph, method, &signature, None, false);
        w.emit(";");
        w.end_line();
    }
    w.dedent();
    w.emit_line("}");
}

/// The holder struct around an enum: the raw value plus conversions both
/// ways, so holder and constant forms interchange at call sites.
fn write_enum_holder_members(w: &mut CxxWriter, graph: &SymbolGraph, def: &TypeDef) {
    let name = native_type_name(graph, def);
    let value = enum_native_name(graph, def);
    w.emit_line(&format!("{value} m_value;"));
    w.emit_line(&format!("{name}() = default;"));
    w.emit_line(&format!("{name}({value} value) : m_value(value) {{}}"));
    w.emit_line(&format!("operator {value}() const {{ return m_value; }}"));
}

fn write_field(w: &mut CxxWriter, graph: &SymbolGraph, field: FieldId) {
    let field = graph.field_def(field);
    let spelled = spell_type(graph, field.ty, Spell::Usage);
    let name = clean_name(graph.names.resolve(field.name));
    if let Some(value) = field.const_value {
        w.emit_line(&format!("static constexpr {spelled} {name} = {value};"));
        return;
    }
    if field.is_static {
        w.emit("static ");
    }
    w.emit_line(&format!("{spelled} {name};"));
}

/// Boxing trait pair for layouts whose value spelling differs from the
/// record: numeric primitives, void, and enums.
fn write_value_trait_wiring(w: &mut CxxWriter, graph: &SymbolGraph, def: &TypeDef) {
    if !def.kind.is_value_layout() {
        return;
    }
    let wired = def.kind == TypeDefKind::Enum
        || def
            .special
            .map(|s| special_keyword(s).is_some())
            .unwrap_or(false);
    if !wired {
        return;
    }
    let value_form = spell_value_form(graph, def);
    let class_form = qualified_type_name(graph, def);
    w.emit_line(&format!(
        "template <> struct valuetype_to_class<{value_form}> {{ typedef {class_form} type; }};"
    ));
    w.emit_line(&format!(
        "template <> struct class_to_valuetype<{class_form}> {{ typedef {value_form} type; }};"
    ));
}

fn write_collector_hint(w: &mut CxxWriter, graph: &SymbolGraph, def: &TypeDef) {
    if def.special == Some(Special::Void) {
        return;
    }
    if !graph.is_atomic(def.id) {
        return;
    }
    w.emit_line(&format!(
        "template <> struct gc_traits<{}> {{ constexpr static GCAtomic atomic = GCAtomic::Default; }};",
        qualified_type_name(graph, def)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::FrontendProvider;
    use crate::units::build_units;

    fn graph() -> SymbolGraph {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Object", "namespace": "System", "kind": "Reference" },
                    { "name": "Int32", "namespace": "System", "kind": "Value" },
                    { "name": "Color", "namespace": "Demo", "kind": "Enum",
                      "underlying": { "Named": { "qualified": "System.Int32" } },
                      "fields": [
                        { "name": "Red", "ty": { "Named": { "qualified": "Demo.Color" } }, "is_static": true, "const_value": 1 },
                        { "name": "Green", "ty": { "Named": { "qualified": "Demo.Color" } }, "is_static": true, "const_value": 2 },
                        { "name": "Blue", "ty": { "Named": { "qualified": "Demo.Color" } }, "is_static": true, "const_value": 4 }
                      ] },
                    { "name": "List", "namespace": "Demo.Collections", "kind": "Reference",
                      "type_params": ["T"],
                      "base": { "Named": { "qualified": "System.Object" } },
                      "fields": [
                        { "name": "items", "ty": { "Array": { "element": { "Param": { "name": "T" } }, "rank": 1 } } },
                        { "name": "count", "ty": { "Named": { "qualified": "System.Int32" } } }
                      ] }
                 ] }"#,
        )
        .unwrap();
        SymbolGraph::ingest(&provider, &[]).unwrap()
    }

    fn unit_for<'a>(
        graph: &SymbolGraph,
        units: &'a [crate::units::TranslationUnit],
        qualified: &str,
        arity: u8,
    ) -> &'a TranslationUnit {
        let id = graph.find_type(qualified, arity).unwrap();
        units.iter().find(|u| u.def == id).unwrap()
    }

    #[test]
    fn enum_forward_expands_constants() {
        let graph = graph();
        let units = build_units(&graph);
        let mut w = CxxWriter::new();
        write_forward_declaration(&mut w, &graph, unit_for(&graph, &units, "Demo.Color", 0));
        let out = w.finish();
        assert!(out.contains(
            "enum class __enum_Color : int32_t { c_Red = 1, c_Green = 2, c_Blue = 4 };"
        ));
        assert!(out.contains("struct Color;"));
        assert!(out.starts_with("namespace Demo {"));
    }

    #[test]
    fn generic_forward_is_one_templated_line() {
        let graph = graph();
        let units = build_units(&graph);
        let mut w = CxxWriter::new();
        write_forward_declaration(
            &mut w,
            &graph,
            unit_for(&graph, &units, "Demo.Collections.List", 1),
        );
        let out = w.finish();
        assert_eq!(
            out,
            "namespace Demo { namespace Collections { template <typename T> class List; } }\n"
        );
    }

    #[test]
    fn object_forward_adds_the_alias() {
        let graph = graph();
        let units = build_units(&graph);
        let mut w = CxxWriter::new();
        write_forward_declaration(&mut w, &graph, unit_for(&graph, &units, "System.Object", 0));
        let out = w.finish();
        assert!(out.contains("typedef System::Object object;"));
    }

    #[test]
    fn full_declaration_carries_base_typedef_and_fields() {
        let graph = graph();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let mut w = CxxWriter::new();
        write_full_declaration(
            &mut w,
            &graph,
            &resolver,
            unit_for(&graph, &units, "Demo.Collections.List", 1),
        );
        let out = w.finish();
        assert!(out.contains("template <typename T>"));
        assert!(out.contains("class List : public System::Object"));
        assert!(out.contains("typedef System::Object base;"));
        assert!(out.contains("__array<T>* items;"));
        assert!(out.contains("int32_t count;"));
        assert!(out.contains("};"));
        assert!(out.ends_with("} }\n"));
    }

    #[test]
    fn enum_full_declaration_holds_and_wires_the_value() {
        let graph = graph();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let mut w = CxxWriter::new();
        write_full_declaration(
            &mut w,
            &graph,
            &resolver,
            unit_for(&graph, &units, "Demo.Color", 0),
        );
        let out = w.finish();
        assert!(out.contains("__enum_Color m_value;"));
        assert!(out.contains(
            "template <> struct valuetype_to_class<Demo::__enum_Color> { typedef Demo::Color type; };"
        ));
        assert!(out.contains(
            "template <> struct class_to_valuetype<Demo::Color> { typedef Demo::__enum_Color type; };"
        ));
        assert!(out.contains("template <> struct gc_traits<Demo::Color>"));
    }

    #[test]
    fn constant_fields_outside_enums_become_constexpr() {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Int32", "namespace": "System", "kind": "Value" },
                    { "name": "Limits", "namespace": "Demo", "kind": "Value",
                      "fields": [
                        { "name": "Max", "ty": { "Named": { "qualified": "System.Int32" } }, "is_static": true, "const_value": 100 }
                      ] }
                 ] }"#,
        )
        .unwrap();
        let graph = SymbolGraph::ingest(&provider, &[]).unwrap();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let mut w = CxxWriter::new();
        write_full_declaration(
            &mut w,
            &graph,
            &resolver,
            unit_for(&graph, &units, "Demo.Limits", 0),
        );
        let out = w.finish();
        assert!(out.contains("static constexpr int32_t Max = 100;"));
    }
}
