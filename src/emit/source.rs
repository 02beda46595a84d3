// src/emit/source.rs
//
// Per-unit source files. A closed unit gets one .cpp with its static
// field definitions, method definitions (lowered bodies, extern
// forwarders), wrapper implementations, and the native entry point when
// the unit owns it. Methods without bodies get their definitions in a
// parallel stub file destined for the impl tree.

use crate::identity::clean_name;
use crate::lower::BodyLowering;
use crate::resolve::{GenericContext, Resolver};
use crate::store::{MethodDef, SymbolGraph};
use crate::errors::Error;
use crate::units::{Declaration, TranslationUnit};

use super::iface::{self, WrapperVariant};
use super::writer::CxxWriter;
use super::{entry, is_void, method_native_name, spell_type, write_method_header, Spell};

/// Thrown by generated stubs until a real body replaces them.
pub(crate) const NOT_IMPLEMENTED_STMT: &str = "throw 0xC000C000u;";

/// Renders the closed source file for `unit`, `None` when the unit has
/// nothing to define outside the header.
pub fn write_unit_source(
    graph: &SymbolGraph,
    resolver: &Resolver,
    lowering: &dyn BodyLowering,
    unit: &TranslationUnit,
    header_name: &str,
) -> Result<Option<String>, Error> {
    let def = graph.type_def(unit.def);
    let owner = spell_type(graph, def.self_ty, Spell::Bare);
    let ctx = GenericContext::empty();
    let mut w = CxxWriter::new();

    for decl in &unit.declarations {
        let Declaration::Field(field) = decl else {
            continue;
        };
        let field = graph.field_def(*field);
        if !field.is_static || field.const_value.is_some() {
            continue;
        }
        let spelled = spell_type(graph, field.ty, Spell::Usage);
        let name = clean_name(graph.names.resolve(field.name));
        w.emit_line(&format!("{spelled} {owner}::{name};"));
        w.blank_line();
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
        if *is_stub || *is_generic {
            continue;
        }
        let method = graph.method_def(*method);
        if method.is_abstract {
            continue;
        }
        let signature = resolver.resolve_signature(method.id, &ctx);
        begin_definition(&mut w, graph, method, &signature, &owner);
        if method.is_extern {
            write_extern_forward(&mut w, graph, method, &signature);
        } else {
            match lowering.lower(graph, method.id, &ctx)? {
                Some(body) => {
                    for statement in body.statements() {
                        w.emit_line(statement.text());
                    }
                }
                None => w.emit_line(NOT_IMPLEMENTED_STMT),
            }
        }
        end_definition(&mut w);
    }

    for decl in &unit.declarations {
        if let Declaration::InterfaceWrapper(iface_ty) = decl {
            iface::write_wrapper_implementations(
                &mut w,
                graph,
                resolver,
                def,
                *iface_ty,
                WrapperVariant::Source,
            );
        }
    }

    if let Some(entry_method) = unit.entry_method {
        entry::write_native_entry(&mut w, graph, resolver, entry_method);
    }

    if w.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("#include \"{header_name}\"\n\n{}", w.finish())))
}

/// Renders the impl-tree stub file for `unit`: one throwing definition
/// per declared-but-bodyless method. `None` when the unit has no stubs.
pub fn write_stub_source(
    graph: &SymbolGraph,
    resolver: &Resolver,
    unit: &TranslationUnit,
    header_name: &str,
) -> Option<String> {
    let def = graph.type_def(unit.def);
    let owner = spell_type(graph, def.self_ty, Spell::Bare);
    let ctx = GenericContext::empty();
    let mut w = CxxWriter::new();

    for decl in &unit.declarations {
        let Declaration::Method {
            method,
            is_stub: true,
            is_generic: false,
        } = decl
        else {
            continue;
        };
        let method = graph.method_def(*method);
        let signature = resolver.resolve_signature(method.id, &ctx);
        begin_definition(&mut w, graph, method, &signature, &owner);
        w.emit_line(NOT_IMPLEMENTED_STMT);
        end_definition(&mut w);
    }

    if w.is_empty() {
        return None;
    }
    Some(format!("#include \"{header_name}\"\n\n{}", w.finish()))
}

fn begin_definition(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    method: &MethodDef,
    signature: &crate::resolve::ResolvedSignature,
    owner: &str,
) {
    write_method_header(w, graph, method, signature, Some(owner), false);
    w.end_line();
    w.emit_line("{");
    w.indent();
}

fn end_definition(w: &mut CxxWriter) {
    w.dedent();
    w.emit_line("}");
    w.blank_line();
}

fn write_extern_forward(
    w: &mut CxxWriter,
    graph: &SymbolGraph,
    method: &MethodDef,
    signature: &crate::resolve::ResolvedSignature,
) {
    let args = signature
        .params
        .iter()
        .map(|p| clean_name(graph.names.resolve(p.name)))
        .collect::<Vec<_>>()
        .join(", ");
    let call = format!("::{}({})", method_native_name(graph, method), args);
    if is_void(graph, signature.ret) {
        w.emit_line(&format!("{call};"));
    } else {
        w.emit_line(&format!("return {call};"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::{LoweredBody, NoLowering, Statement};
    use crate::store::MethodId;
    use crate::symbols::FrontendProvider;
    use crate::units::build_units;

    struct FixedBody;

    impl BodyLowering for FixedBody {
        fn lower(
            &self,
            graph: &SymbolGraph,
            method: MethodId,
            _ctx: &GenericContext,
        ) -> Result<Option<LoweredBody>, Error> {
            let def = graph.method_def(method);
            if graph.names.resolve(def.name) == "Tick" {
                Ok(Some(LoweredBody::new(vec![
                    Statement::new("instances = instances + 1;"),
                    Statement::new("return instances;"),
                ])))
            } else {
                Ok(None)
            }
        }
    }

    fn graph() -> SymbolGraph {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Object", "namespace": "System", "kind": "Reference" },
                    { "name": "Void", "namespace": "System", "kind": "Value" },
                    { "name": "Int32", "namespace": "System", "kind": "Value" },
                    { "name": "Counter", "namespace": "Demo", "kind": "Reference",
                      "base": { "Named": { "qualified": "System.Object" } },
                      "fields": [
                        { "name": "instances", "ty": { "Named": { "qualified": "System.Int32" } }, "is_static": true }
                      ],
                      "methods": [
                        { "name": "Tick", "ret": { "Named": { "qualified": "System.Int32" } }, "is_static": true, "body": 0 },
                        { "name": "Reset", "ret": { "Named": { "qualified": "System.Void" } }, "is_static": true },
                        { "name": "puts", "ret": { "Named": { "qualified": "System.Int32" } },
                          "params": [ { "name": "text", "ty": { "Named": { "qualified": "System.Int32" } } } ],
                          "is_static": true, "is_extern": true }
                      ] }
                 ] }"#,
        )
        .unwrap();
        SymbolGraph::ingest(&provider, &[]).unwrap()
    }

    fn counter_unit(
        graph: &SymbolGraph,
        units: &[TranslationUnit],
    ) -> TranslationUnit {
        let id = graph.find_type("Demo.Counter", 0).unwrap();
        units.iter().find(|u| u.def == id).unwrap().clone()
    }

    #[test]
    fn source_defines_statics_bodies_and_extern_forwarders() {
        let graph = graph();
        let units = build_units(&graph);
        let unit = counter_unit(&graph, &units);
        let resolver = Resolver::new(&graph);
        let out = write_unit_source(&graph, &resolver, &FixedBody, &unit, "Demo.h")
            .unwrap()
            .unwrap();
        assert!(out.starts_with("#include \"Demo.h\"\n"));
        assert!(out.contains("int32_t Demo::Counter::instances;"));
        assert!(out.contains("int32_t Demo::Counter::Tick()"));
        assert!(out.contains("    instances = instances + 1;"));
        assert!(out.contains("int32_t Demo::Counter::puts(int32_t text)"));
        assert!(out.contains("return ::puts(text);"));
        // Reset has no body: declared here, defined in the stub tree.
        assert!(!out.contains("Demo::Counter::Reset"));
    }

    #[test]
    fn stub_file_carries_only_bodyless_methods() {
        let graph = graph();
        let units = build_units(&graph);
        let unit = counter_unit(&graph, &units);
        let resolver = Resolver::new(&graph);
        let out = write_stub_source(&graph, &resolver, &unit, "Demo.h").unwrap();
        assert!(out.contains("void Demo::Counter::Reset()"));
        assert!(out.contains(NOT_IMPLEMENTED_STMT));
        assert!(!out.contains("Tick"));
        assert!(!out.contains("puts"));
    }

    #[test]
    fn bodyless_unit_with_nolowering_still_writes_no_source_when_empty() {
        let provider = FrontendProvider::from_json(
            "test.json",
            r#"{ "assembly": { "name": "Demo" },
                 "types": [
                    { "name": "Object", "namespace": "System", "kind": "Reference" },
                    { "name": "Marker", "namespace": "Demo", "kind": "Reference",
                      "base": { "Named": { "qualified": "System.Object" } } }
                 ] }"#,
        )
        .unwrap();
        let graph = SymbolGraph::ingest(&provider, &[]).unwrap();
        let units = build_units(&graph);
        let id = graph.find_type("Demo.Marker", 0).unwrap();
        let unit = units.iter().find(|u| u.def == id).unwrap();
        let resolver = Resolver::new(&graph);
        let out = write_unit_source(&graph, &resolver, &NoLowering, unit, "Demo.h").unwrap();
        assert!(out.is_none());
    }
}
