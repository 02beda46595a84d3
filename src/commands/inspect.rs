// src/commands/inspect.rs

use std::path::Path;
use std::process::ExitCode;

use super::common::load_source;
use crate::errors::render_to_stderr;

/// Dump the assembly identity and declared types of one symbol input.
pub fn inspect_input(input: &Path) -> ExitCode {
    let source = match load_source(input) {
        Ok(source) => source,
        Err(err) => {
            render_to_stderr(&err);
            return ExitCode::FAILURE;
        }
    };

    let identity = source.assembly();
    println!("assembly {}", identity.name);
    for reference in &identity.references {
        println!("  references {reference}");
    }
    for index in 0..source.type_count() {
        let ty = source.type_at(index);
        let qualified = if ty.namespace.is_empty() {
            ty.name.clone()
        } else {
            format!("{}.{}", ty.namespace, ty.name)
        };
        let arity = if ty.type_params.is_empty() {
            String::new()
        } else {
            format!("<{}>", ty.type_params.join(", "))
        };
        println!(
            "  {:?} {qualified}{arity}  fields={} methods={}",
            ty.kind,
            ty.fields.len(),
            ty.methods.len()
        );
    }
    ExitCode::SUCCESS
}
