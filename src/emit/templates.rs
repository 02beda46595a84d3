// src/emit/templates.rs
//
// Template headers. Generic definitions cannot live in a .cpp, so any
// unit that is generic, owns generic methods, or wraps an interface with
// generic members gets a header with the out-of-line definitions:
// templated statics, method bodies, wrapper implementations. Bodyless
// generic methods get the same treatment in a separate impl-variant
// header meant for hand completion.

use crate::errors::Error;
use crate::identity::clean_name;
use crate::lower::BodyLowering;
use crate::resolve::{GenericContext, Resolver};
use crate::store::{SymbolGraph, TypeDef};
use crate::units::{Declaration, TranslationUnit};

use super::iface::{self, WrapperVariant};
use super::source::NOT_IMPLEMENTED_STMT;
use super::writer::CxxWriter;
use super::{namespace_parts, native_type_name, spell_type, write_method_header, write_template_head, Spell};

/// True when the unit has anything templated to define out of line: its
/// own genericity, generic methods, or interface wrappers whose dispatch
/// set carries generic members.
pub fn needs_template_header(
    graph: &SymbolGraph,
    resolver: &Resolver,
    unit: &TranslationUnit,
) -> bool {
    if unit.is_generic || unit.has_generic_declarations() {
        return true;
    }
    unit.declarations.iter().any(|decl| {
        matches!(decl, Declaration::InterfaceWrapper(iface_ty)
            if iface::has_generic_dispatch_members(graph, resolver, *iface_ty))
    })
}

fn guard_tag(graph: &SymbolGraph, def: &TypeDef) -> String {
    let mut parts = namespace_parts(graph, def.key.namespace);
    parts.push(native_type_name(graph, def));
    parts.join("_")
}

fn wrap_guard(tag: &str, body: &str) -> String {
    format!("#ifndef {tag}\n#define {tag}\n\n{body}#endif\n")
}

/// Renders the unit's template header, `None` when nothing generic needs
/// a definition here.
pub fn write_template_header(
    graph: &SymbolGraph,
    resolver: &Resolver,
    lowering: &dyn BodyLowering,
    unit: &TranslationUnit,
) -> Result<Option<String>, Error> {
    let def = graph.type_def(unit.def);
    let owner = spell_type(graph, def.self_ty, Spell::Bare);
    let ctx = GenericContext::empty();
    let mut w = CxxWriter::new();

    if def.is_generic() {
        for decl in &unit.declarations {
            let Declaration::Field(field) = decl else {
                continue;
            };
            let field = graph.field_def(*field);
            if !field.is_static || field.const_value.is_some() {
                continue;
            }
            write_template_head(&mut w, graph, &def.type_params);
            w.emit_line(&format!(
                "{} {owner}::{};",
                spell_type(graph, field.ty, Spell::Usage),
                clean_name(graph.names.resolve(field.name))
            ));
            w.blank_line();
        }
    }

    for decl in &unit.declarations {
        let Declaration::Method {
            method,
            is_stub,
            is_generic,
        } = decl
        else {
            continue;
        };
        if !*is_generic || *is_stub {
            continue;
        }
        let method = graph.method_def(*method);
        if method.is_abstract || method.is_extern {
            continue;
        }
        let signature = resolver.resolve_signature(method.id, &ctx);
        if def.is_generic() {
            write_template_head(&mut w, graph, &def.type_params);
        }
        if method.is_generic() {
            write_template_head(&mut w, graph, &method.type_params);
        }
        write_method_header(&mut w, graph, method, &signature, Some(&owner), false);
        w.end_line();
        w.emit_line("{");
        w.indent();
        match lowering.lower(graph, method.id, &ctx)? {
            Some(body) => {
                for statement in body.statements() {
                    w.emit_line(statement.text());
                }
            }
            None => w.emit_line(NOT_IMPLEMENTED_STMT),
        }
        w.dedent();
        w.emit_line("}");
        w.blank_line();
    }

    // The variant filter keeps only generic members here, so closed
    // owners still land their generic interface forwards in this header.
    for decl in &unit.declarations {
        if let Declaration::InterfaceWrapper(iface_ty) = decl {
            iface::write_wrapper_implementations(
                &mut w,
                graph,
                resolver,
                def,
                *iface_ty,
                WrapperVariant::TemplateHeader,
            );
        }
    }

    if w.is_empty() {
        return Ok(None);
    }
    let tag = format!("HEADER_{}", guard_tag(graph, def));
    Ok(Some(wrap_guard(&tag, &w.finish())))
}

/// Renders the impl-variant template header with throwing stubs for
/// bodyless generic methods, `None` when the unit has none.
pub fn write_template_stub_header(
    graph: &SymbolGraph,
    resolver: &Resolver,
    unit: &TranslationUnit,
) -> Option<String> {
    let def = graph.type_def(unit.def);
    let owner = spell_type(graph, def.self_ty, Spell::Bare);
    let ctx = GenericContext::empty();
    let mut w = CxxWriter::new();

    for decl in &unit.declarations {
        let Declaration::Method {
            method,
            is_stub: true,
            is_generic: true,
        } = decl
        else {
            continue;
        };
        let method = graph.method_def(*method);
        let signature = resolver.resolve_signature(method.id, &ctx);
        if def.is_generic() {
            write_template_head(&mut w, graph, &def.type_params);
        }
        if method.is_generic() {
            write_template_head(&mut w, graph, &method.type_params);
        }
        write_method_header(&mut w, graph, method, &signature, Some(&owner), false);
        w.end_line();
        w.emit_line("{");
        w.indent();
        w.emit_line(NOT_IMPLEMENTED_STMT);
        w.dedent();
        w.emit_line("}");
        w.blank_line();
    }

    if w.is_empty() {
        return None;
    }
    let tag = format!("HEADER_IMPL_{}", guard_tag(graph, def));
    Some(wrap_guard(&tag, &w.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::NoLowering;
    use crate::symbols::FrontendProvider;
    use crate::units::build_units;

    fn graph() -> SymbolGraph {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Object", "namespace": "System", "kind": "Reference" },
                    { "name": "Void", "namespace": "System", "kind": "Value" },
                    { "name": "Int32", "namespace": "System", "kind": "Value" },
                    { "name": "List", "namespace": "Demo", "kind": "Reference",
                      "type_params": ["T"],
                      "base": { "Named": { "qualified": "System.Object" } },
                      "fields": [
                        { "name": "version", "ty": { "Named": { "qualified": "System.Int32" } }, "is_static": true }
                      ],
                      "methods": [
                        { "name": "Add", "ret": { "Named": { "qualified": "System.Void" } },
                          "params": [ { "name": "item", "ty": { "Param": { "name": "T" } } } ],
                          "body": 0 },
                        { "name": "Reserve", "ret": { "Named": { "qualified": "System.Void" } },
                          "params": [ { "name": "capacity", "ty": { "Named": { "qualified": "System.Int32" } } } ] }
                      ] },
                    { "name": "Util", "namespace": "Demo", "kind": "Reference",
                      "base": { "Named": { "qualified": "System.Object" } },
                      "methods": [
                        { "name": "Identity", "type_params": ["M"],
                          "ret": { "Param": { "name": "M" } },
                          "params": [ { "name": "value", "ty": { "Param": { "name": "M" } } } ],
                          "is_static": true, "body": 1 }
                      ] },
                    { "name": "Plain", "namespace": "Demo", "kind": "Reference",
                      "base": { "Named": { "qualified": "System.Object" } } }
                 ] }"#,
        )
        .unwrap();
        SymbolGraph::ingest(&provider, &[]).unwrap()
    }

    fn unit_for<'a>(
        graph: &SymbolGraph,
        units: &'a [TranslationUnit],
        qualified: &str,
        arity: u8,
    ) -> &'a TranslationUnit {
        let id = graph.find_type(qualified, arity).unwrap();
        units.iter().find(|u| u.def == id).unwrap()
    }

    #[test]
    fn generic_unit_header_defines_statics_and_methods() {
        let graph = graph();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let out = write_template_header(
            &graph,
            &resolver,
            &NoLowering,
            unit_for(&graph, &units, "Demo.List", 1),
        )
        .unwrap()
        .unwrap();
        assert!(out.starts_with("#ifndef HEADER_Demo_List\n#define HEADER_Demo_List\n"));
        assert!(out.ends_with("#endif\n"));
        assert!(out.contains("template <typename T>\nint32_t Demo::List<T>::version;"));
        assert!(out.contains("void Demo::List<T>::Add(T item)"));
        // bodyless Reserve belongs to the impl-variant header
        assert!(!out.contains("Reserve"));
    }

    #[test]
    fn generic_method_on_closed_type_gets_its_own_head() {
        let graph = graph();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let out = write_template_header(
            &graph,
            &resolver,
            &NoLowering,
            unit_for(&graph, &units, "Demo.Util", 0),
        )
        .unwrap()
        .unwrap();
        assert!(out.contains("template <typename M>\nM Demo::Util::Identity(M value)"));
        assert!(!out.contains("template <typename T>"));
    }

    #[test]
    fn units_without_generics_produce_no_header() {
        let graph = graph();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let out = write_template_header(
            &graph,
            &resolver,
            &NoLowering,
            unit_for(&graph, &units, "Demo.Plain", 0),
        )
        .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn closed_implementor_gets_a_header_for_generic_wrapper_members() {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Object", "namespace": "System", "kind": "Reference" },
                    { "name": "Void", "namespace": "System", "kind": "Value" },
                    { "name": "IMapper", "namespace": "Demo", "kind": "Interface",
                      "methods": [
                        { "name": "Map", "type_params": ["U"],
                          "ret": { "Param": { "name": "U" } },
                          "params": [ { "name": "value", "ty": { "Param": { "name": "U" } } } ],
                          "is_abstract": true }
                      ] },
                    { "name": "Base", "namespace": "Demo", "kind": "Reference",
                      "base": { "Named": { "qualified": "System.Object" } },
                      "methods": [
                        { "name": "Map", "type_params": ["U"],
                          "ret": { "Param": { "name": "U" } },
                          "params": [ { "name": "value", "ty": { "Param": { "name": "U" } } } ],
                          "body": 0 }
                      ] },
                    { "name": "Derived", "namespace": "Demo", "kind": "Reference",
                      "base": { "Named": { "qualified": "Demo.Base" } },
                      "interfaces": [ { "Named": { "qualified": "Demo.IMapper" } } ] }
                 ] }"#,
        )
        .unwrap();
        let graph = SymbolGraph::ingest(&provider, &[]).unwrap();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let unit = unit_for(&graph, &units, "Demo.Derived", 0);

        // Derived declares nothing generic itself; the wrapper alone
        // forces the header.
        assert!(!unit.is_generic);
        assert!(!unit.has_generic_declarations());
        assert!(needs_template_header(&graph, &resolver, unit));

        let out = write_template_header(&graph, &resolver, &NoLowering, unit)
            .unwrap()
            .unwrap();
        assert!(out.contains("template <typename U>"));
        assert!(out.contains("U Demo::Derived::__iface_Demo__IMapper::Map(U value)"));
        assert!(out.contains("return __this->Map(value);"));
    }

    #[test]
    fn stub_header_carries_bodyless_generic_methods() {
        let graph = graph();
        let units = build_units(&graph);
        let resolver = Resolver::new(&graph);
        let out = write_template_stub_header(
            &graph,
            &resolver,
            unit_for(&graph, &units, "Demo.List", 1),
        )
        .unwrap();
        assert!(out.starts_with("#ifndef HEADER_IMPL_Demo_List\n"));
        assert!(out.contains("void Demo::List<T>::Reserve(int32_t capacity)"));
        assert!(out.contains(NOT_IMPLEMENTED_STMT));
        assert!(!out.contains("Add"));
    }
}
