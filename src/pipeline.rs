// src/pipeline.rs
//
// Translation driver. Phases run in a fixed order: ingest providers into
// the graph, build the declaration model, plan every output path, check
// that every closed unit's surface is closed, render template headers,
// render the aggregate header, then fan the surviving closed units out
// across threads for source and stub emission, and finish with the build
// descriptors. Per-unit failures (semantic or I/O) are collected so one
// bad type never blocks its siblings, and a unit that fails the closed
// check is left out of every rendered artifact; failures writing
// assembly-level artifacts abort the run.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::emit::{self, BuildPlan, HeaderPlan};
use crate::errors::Error;
use crate::lower::BodyLowering;
use crate::output::{
    assembly_header_path, unit_source_path, unit_stub_path, unit_template_path,
    unit_template_stub_path, write_if_absent, write_if_changed, PathPlanner, WriteOutcome,
};
use crate::resolve::{GenericContext, Resolver};
use crate::store::{SymbolGraph, TypeDefId};
use crate::symbols::SymbolSource;
use crate::units::{build_units, Declaration, TranslationUnit};

#[derive(Debug)]
pub struct TranslateReport {
    pub assembly: String,
    pub root: PathBuf,
    pub files_written: usize,
    pub files_unchanged: usize,
    /// Per-unit failures; output for every other unit is complete.
    pub failures: Vec<Error>,
}

impl TranslateReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct UnitPlan<'a> {
    unit: &'a TranslationUnit,
    source_path: Option<String>,
    stub_path: Option<String>,
    template_path: Option<String>,
    template_stub_path: Option<String>,
}

fn tally(outcome: WriteOutcome, written: &mut usize, unchanged: &mut usize) {
    match outcome {
        WriteOutcome::Written => *written += 1,
        WriteOutcome::Unchanged => *unchanged += 1,
    }
}

pub fn translate(
    primary: &dyn SymbolSource,
    references: &[&dyn SymbolSource],
    lowering: &(dyn BodyLowering + Sync),
    out_dir: &Path,
) -> Result<TranslateReport, Error> {
    let identity = primary.assembly();
    let _span = tracing::info_span!("translate", assembly = %identity.name).entered();

    let graph = SymbolGraph::ingest(primary, references)?;
    let units = build_units(&graph);
    debug!(types = units.len(), "declaration model built");
    let resolver = Resolver::new(&graph);

    let reference_names: Vec<String> = references.iter().map(|r| r.assembly().name).collect();
    let assembly_root = out_dir.join(&identity.name);
    let header_rel = assembly_header_path(&identity.name);
    let header_name = format!("{}.h", identity.name);

    let mut planner = PathPlanner::new();
    // reserved under a tag no type display can spell, so a root-namespace
    // type named like the assembly gets suffixed instead of colliding
    let header_owner = format!("{} header", identity.name);
    planner.allocate(&header_rel, &header_owner);
    let mut plans = Vec::with_capacity(units.len());
    for unit in &units {
        let def = graph.type_def(unit.def);
        let owner = graph.names.type_key_display(def.key);
        let wants_templates = emit::needs_template_header(&graph, &resolver, unit);
        let template_path =
            wants_templates.then(|| planner.allocate(&unit_template_path(&graph, def), &owner));
        let template_stub_path =
            wants_templates.then(|| planner.allocate(&unit_template_stub_path(&graph, def), &owner));
        let (source_path, stub_path) = if unit.is_generic {
            (None, None)
        } else {
            (
                Some(planner.allocate(&unit_source_path(&graph, def), &owner)),
                Some(planner.allocate(&unit_stub_path(&graph, def), &owner)),
            )
        };
        plans.push(UnitPlan {
            unit,
            source_path,
            stub_path,
            template_path,
            template_stub_path,
        });
    }

    let mut written = 0usize;
    let mut unchanged = 0usize;
    let mut failures: Vec<Error> = Vec::new();

    // Closed units are validated up front so a failing unit never reaches
    // the aggregate header or the source fan-out.
    let mut failed_units: FxHashSet<TypeDefId> = FxHashSet::default();
    for unit in &units {
        if unit.is_generic {
            continue;
        }
        if let Err(err) = check_unit_closed(&graph, &resolver, unit) {
            failed_units.insert(unit.def);
            failures.push(err);
        }
    }

    let mut template_includes: Vec<String> = Vec::new();
    for plan in &plans {
        if failed_units.contains(&plan.unit.def) {
            continue;
        }
        let Some(path) = &plan.template_path else {
            continue;
        };
        match emit::write_template_header(&graph, &resolver, lowering, plan.unit)
            .and_then(|content| match content {
                Some(content) => write_if_changed(&assembly_root.join(path), &content).map(Some),
                None => Ok(None),
            }) {
            Ok(Some(outcome)) => {
                tally(outcome, &mut written, &mut unchanged);
                // relative to the aggregate header's directory, src/
                template_includes.push(path.trim_start_matches("src/").to_string());
            }
            Ok(None) => {}
            Err(err) => failures.push(err),
        }
        if let Some(stub_path) = &plan.template_stub_path {
            if let Some(content) = emit::write_template_stub_header(&graph, &resolver, plan.unit) {
                match write_if_absent(&assembly_root.join(stub_path), &content) {
                    Ok(outcome) => {
                        tally(outcome, &mut written, &mut unchanged);
                        template_includes.push(format!("../{stub_path}"));
                    }
                    Err(err) => failures.push(err),
                }
            }
        }
    }
    debug!(headers = template_includes.len(), "template headers rendered");

    let header_units: Vec<TranslationUnit> = units
        .iter()
        .filter(|unit| !failed_units.contains(&unit.def))
        .cloned()
        .collect();
    let header_content = emit::write_assembly_header(
        &graph,
        &resolver,
        &header_units,
        &HeaderPlan {
            assembly: &identity.name,
            references: &reference_names,
            template_includes: &template_includes,
        },
    );
    let outcome = write_if_changed(&assembly_root.join(&header_rel), &header_content)?;
    tally(outcome, &mut written, &mut unchanged);

    let results: Vec<Result<(usize, usize), Error>> = plans
        .par_iter()
        .filter(|plan| !plan.unit.is_generic && !failed_units.contains(&plan.unit.def))
        .map(|plan| {
            let mut written = 0usize;
            let mut unchanged = 0usize;
            if let Some(path) = &plan.source_path {
                if let Some(content) =
                    emit::write_unit_source(&graph, &resolver, lowering, plan.unit, &header_name)?
                {
                    let outcome = write_if_changed(&assembly_root.join(path), &content)?;
                    tally(outcome, &mut written, &mut unchanged);
                }
            }
            if let Some(path) = &plan.stub_path {
                if let Some(content) =
                    emit::write_stub_source(&graph, &resolver, plan.unit, &header_name)
                {
                    let outcome = write_if_absent(&assembly_root.join(path), &content)?;
                    tally(outcome, &mut written, &mut unchanged);
                }
            }
            Ok((written, unchanged))
        })
        .collect();
    for result in results {
        match result {
            Ok((w, u)) => {
                written += w;
                unchanged += u;
            }
            Err(err) => failures.push(err),
        }
    }

    let build_plan = BuildPlan {
        assembly: &identity.name,
        is_executable: graph.entry().is_some(),
        references: &reference_names,
    };
    for (name, content) in emit::write_build_files(&build_plan) {
        let outcome = write_if_changed(&assembly_root.join(name), &content)?;
        tally(outcome, &mut written, &mut unchanged);
    }

    info!(
        written,
        unchanged,
        failures = failures.len(),
        "translation finished"
    );
    Ok(TranslateReport {
        assembly: identity.name,
        root: assembly_root,
        files_written: written,
        files_unchanged: unchanged,
        failures,
    })
}

/// A closed unit's declared surface must not retain generic parameters:
/// base clause, interface list, field types, and every non-generic
/// method signature. One that does names the first offender.
fn check_unit_closed(
    graph: &SymbolGraph,
    resolver: &Resolver,
    unit: &TranslationUnit,
) -> Result<(), Error> {
    let ctx = GenericContext::empty();
    let def = graph.type_def(unit.def);
    let type_display = graph.names.type_key_display(def.key);
    for ty in def.base.iter().chain(&def.interfaces) {
        resolver.ensure_closed(*ty, &type_display)?;
    }
    for decl in &unit.declarations {
        match decl {
            Declaration::Field(field) => {
                let field = graph.field_def(*field);
                let owner = format!("{type_display}.{}", graph.names.resolve(field.name));
                resolver.ensure_closed(field.ty, &owner)?;
            }
            Declaration::Method {
                method,
                is_generic: false,
                ..
            } => {
                let signature = resolver.resolve_signature(*method, &ctx);
                let owner = graph.display_method(*method);
                resolver.ensure_closed(signature.ret, &owner)?;
                for param in &signature.params {
                    resolver.ensure_closed(param.ty, &owner)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::NoLowering;
    use crate::symbols::FrontendProvider;

    fn provider(types_json: &str) -> FrontendProvider {
        let json = format!(
            r#"{{ "assembly": {{ "name": "Demo" }}, "types": [
                  {{ "name": "Object", "namespace": "System", "kind": "Reference" }},
                  {{ "name": "Void", "namespace": "System", "kind": "Value" }},
                  {{ "name": "Int32", "namespace": "System", "kind": "Value" }}{types_json} ] }}"#
        );
        FrontendProvider::from_json("test.json", &json).unwrap()
    }

    #[test]
    fn second_run_rewrites_nothing() {
        let provider = provider(
            r#",
               { "name": "Program", "namespace": "Demo", "kind": "Reference",
                 "base": { "Named": { "qualified": "System.Object" } },
                 "methods": [
                   { "name": "Main", "ret": { "Named": { "qualified": "System.Void" } },
                     "is_static": true, "is_entry": true, "body": 0 }
                 ] }"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let first = translate(&provider, &[], &NoLowering, dir.path()).unwrap();
        assert!(first.is_clean());
        assert!(first.files_written > 0);
        assert!(dir.path().join("Demo/src/Demo.h").exists());
        assert!(dir.path().join("Demo/src/Demo/Program.cpp").exists());
        assert!(dir.path().join("Demo/CMakeLists.txt").exists());

        let second = translate(&provider, &[], &NoLowering, dir.path()).unwrap();
        assert_eq!(second.files_written, 0);
        assert_eq!(
            second.files_unchanged,
            first.files_written + first.files_unchanged
        );
    }

    #[test]
    fn unresolved_parameter_fails_its_unit_only() {
        let provider = provider(
            r#",
               { "name": "Broken", "namespace": "Demo", "kind": "Reference",
                 "base": { "Named": { "qualified": "System.Object" } },
                 "methods": [
                   { "name": "Get", "ret": { "Param": { "name": "T" } }, "is_static": true, "body": 0 }
                 ] },
               { "name": "Fine", "namespace": "Demo", "kind": "Reference",
                 "base": { "Named": { "qualified": "System.Object" } },
                 "methods": [
                   { "name": "Run", "ret": { "Named": { "qualified": "System.Void" } }, "is_static": true, "body": 0 }
                 ] }"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let report = translate(&provider, &[], &NoLowering, dir.path()).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            Error::UnresolvedGenericParameter { .. }
        ));
        assert!(dir.path().join("Demo/src/Demo/Fine.cpp").exists());
        assert!(!dir.path().join("Demo/src/Demo/Broken.cpp").exists());
    }

    #[test]
    fn open_field_fails_its_unit_before_the_header() {
        let provider = provider(
            r#",
               { "name": "Holder", "namespace": "Demo", "kind": "Reference",
                 "base": { "Named": { "qualified": "System.Object" } },
                 "fields": [ { "name": "item", "ty": { "Param": { "name": "T" } } } ],
                 "methods": [
                   { "name": "Run", "ret": { "Named": { "qualified": "System.Void" } }, "is_static": true, "body": 0 }
                 ] }"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let report = translate(&provider, &[], &NoLowering, dir.path()).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            Error::UnresolvedGenericParameter { .. }
        ));
        assert!(!dir.path().join("Demo/src/Demo/Holder.cpp").exists());
        let header = std::fs::read_to_string(dir.path().join("Demo/src/Demo.h")).unwrap();
        assert!(!header.contains("T item;"));
        assert!(!header.contains("class Holder"));
    }

    #[test]
    fn generic_units_emit_headers_not_sources() {
        let provider = provider(
            r#",
               { "name": "List", "namespace": "Demo", "kind": "Reference",
                 "type_params": ["T"],
                 "base": { "Named": { "qualified": "System.Object" } },
                 "methods": [
                   { "name": "Add", "ret": { "Named": { "qualified": "System.Void" } },
                     "params": [ { "name": "item", "ty": { "Param": { "name": "T" } } } ],
                     "body": 0 }
                 ] }"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let report = translate(&provider, &[], &NoLowering, dir.path()).unwrap();
        assert!(report.is_clean());
        assert!(dir.path().join("Demo/src/Demo/List.h").exists());
        assert!(!dir.path().join("Demo/src/Demo/List.cpp").exists());
        let header = std::fs::read_to_string(dir.path().join("Demo/src/Demo.h")).unwrap();
        assert!(header.contains("#include \"Demo/List.h\""));
    }
}
