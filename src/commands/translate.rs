// src/commands/translate.rs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::common::load_source;
use crate::errors::render_to_stderr;
use crate::lower::NoLowering;
use crate::pipeline;
use crate::symbols::SymbolSource;

/// Translate one primary input (plus its references) into a native source
/// tree under `out`.
pub fn translate_input(input: &Path, references: &[PathBuf], out: &Path) -> ExitCode {
    let primary = match load_source(input) {
        Ok(source) => source,
        Err(err) => {
            render_to_stderr(&err);
            return ExitCode::FAILURE;
        }
    };
    let mut loaded = Vec::with_capacity(references.len());
    for path in references {
        match load_source(path) {
            Ok(source) => loaded.push(source),
            Err(err) => {
                render_to_stderr(&err);
                return ExitCode::FAILURE;
            }
        }
    }
    let references: Vec<&dyn SymbolSource> = loaded.iter().map(|b| b.as_ref()).collect();

    match pipeline::translate(primary.as_ref(), &references, &NoLowering, out) {
        Ok(report) if report.is_clean() => {
            println!(
                "{}: {} file(s) written, {} unchanged -> {}",
                report.assembly,
                report.files_written,
                report.files_unchanged,
                report.root.display()
            );
            ExitCode::SUCCESS
        }
        Ok(report) => {
            for failure in &report.failures {
                render_to_stderr(failure);
            }
            eprintln!("error: {} unit(s) failed to translate", report.failures.len());
            ExitCode::FAILURE
        }
        Err(err) => {
            render_to_stderr(&err);
            ExitCode::FAILURE
        }
    }
}
