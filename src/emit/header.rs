// src/emit/header.rs
//
// The aggregate assembly header: include guard, runtime and reference
// includes, every forward declaration, every full declaration (already
// ordered so bases precede their dependents), then the template-header
// includes. Every generated source includes exactly this one file.

use crate::resolve::Resolver;
use crate::store::SymbolGraph;
use crate::units::TranslationUnit;

use super::writer::CxxWriter;
use super::{decl, write_forward_declaration};
use crate::identity::clean_name;

/// Inputs the header pass cannot derive from the graph: assembly naming,
/// reference order, and the relative paths of the template headers.
pub struct HeaderPlan<'a> {
    pub assembly: &'a str,
    pub references: &'a [String],
    pub template_includes: &'a [String],
}

pub fn write_assembly_header(
    graph: &SymbolGraph,
    resolver: &Resolver,
    units: &[TranslationUnit],
    plan: &HeaderPlan,
) -> String {
    let tag = format!("HEADER_{}", clean_name(plan.assembly));
    let mut w = CxxWriter::new();

    w.emit_line(&format!("#ifndef {tag}"));
    w.emit_line(&format!("#define {tag}"));
    w.blank_line();
    w.emit_line("#include <cstdint>");
    w.emit_line("#include <cstdlib>");
    w.emit_line("#include \"gc.h\"");
    w.emit_line("#include \"__runtime.h\"");
    for reference in plan.references {
        w.emit_line(&format!("#include \"{reference}.h\""));
    }
    w.blank_line();

    for unit in units {
        if unit.forwarded_by_owner {
            continue;
        }
        write_forward_declaration(&mut w, graph, unit);
    }
    w.blank_line();

    for unit in units {
        decl::write_full_declaration(&mut w, graph, resolver, unit);
        w.blank_line();
    }

    for include in plan.template_includes {
        w.emit_line(&format!("#include \"{include}\""));
    }
    if !plan.template_includes.is_empty() {
        w.blank_line();
    }
    w.emit_line("#endif");
    w.finish()
}
