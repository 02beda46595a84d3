// src/errors.rs
//
// Crate-wide error taxonomy. Every failure names the symbol, method, or
// path it concerns; nothing is swallowed or downgraded.

use std::path::PathBuf;

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, ThemeCharacters, ThemeStyles};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A referenced type or member is absent from the unified symbol graph.
    /// Always fatal for the pass that hit it.
    #[error("symbol '{name}' referenced from '{referenced_from}' was not found in the symbol graph")]
    #[diagnostic(
        code(E1001),
        help("every assembly the input references must be supplied as an input as well")
    )]
    SymbolNotFound {
        name: String,
        referenced_from: String,
    },

    /// A symbol input (metadata image or frontend graph) could not be
    /// decoded.
    #[error("failed to decode symbol input '{assembly}': {detail}")]
    #[diagnostic(code(E1002))]
    MetadataDecode { assembly: String, detail: String },

    /// Two methods carry the entry-point marker.
    #[error("duplicate entry point: '{second}' conflicts with '{first}'")]
    #[diagnostic(
        code(E1003),
        help("exactly one method across the whole graph may be marked as the entry point")
    )]
    DuplicateEntryPoint { first: String, second: String },

    /// A generic parameter survived resolution of a unit that was supposed
    /// to be fully closed. This is a bug in the engine or in the caller's
    /// context, never a user error.
    #[error("generic parameter '{param}' of '{owner}' survived resolution of a closed unit")]
    #[diagnostic(
        code(E2001),
        help("the generic context supplied for this unit is missing a binding")
    )]
    UnresolvedGenericParameter { owner: String, param: String },

    /// Writing an output artifact failed. Fatal for the unit, not for its
    /// siblings.
    #[error("failed to write output '{}'", path.display())]
    #[diagnostic(code(E3001))]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The body-lowering collaborator reported a failure for a method.
    #[error("lowering method '{method}' failed: {detail}")]
    #[diagnostic(code(E3002))]
    Lower { method: String, detail: String },
}

impl Error {
    pub fn output_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::OutputIo {
            path: path.into(),
            source,
        }
    }
}

/// Handler for terminal output (unicode + colors).
pub fn terminal_handler() -> GraphicalReportHandler {
    let theme = GraphicalTheme {
        characters: ThemeCharacters::unicode(),
        styles: ThemeStyles::ansi(),
    };
    GraphicalReportHandler::new_themed(theme)
}

/// Handler for snapshot testing (ascii + no colors).
pub fn snapshot_handler() -> GraphicalReportHandler {
    let theme = GraphicalTheme {
        characters: ThemeCharacters::ascii(),
        styles: ThemeStyles::none(),
    };
    GraphicalReportHandler::new_themed(theme)
}

pub fn render_to_stderr(report: &dyn Diagnostic) {
    let handler = terminal_handler();
    let mut output = String::new();
    if handler.render_report(&mut output, report).is_ok() {
        eprint!("{}", output);
    }
}

pub fn render_to_string(report: &dyn Diagnostic) -> String {
    let mut output = String::new();
    let handler = snapshot_handler();
    let _ = handler.render_report(&mut output, report);
    output
}
