// src/commands/common.rs
//! Shared utilities for CLI commands.

use std::fs;
use std::path::Path;

use crate::errors::Error;
use crate::symbols::{BincodeDecoder, FrontendProvider, MetadataProvider, SymbolSource};

/// Loads one symbol input, picking the provider by extension: `.json`
/// files carry a source-level graph, anything else a metadata image.
pub fn load_source(path: &Path) -> Result<Box<dyn SymbolSource>, Error> {
    let origin = path.display().to_string();
    let bytes = fs::read(path).map_err(|err| Error::MetadataDecode {
        assembly: origin.clone(),
        detail: err.to_string(),
    })?;
    if path.extension().is_some_and(|ext| ext == "json") {
        let text = String::from_utf8(bytes).map_err(|err| Error::MetadataDecode {
            assembly: origin.clone(),
            detail: err.to_string(),
        })?;
        Ok(Box::new(FrontendProvider::from_json(&origin, &text)?))
    } else {
        Ok(Box::new(MetadataProvider::from_bytes(
            &origin,
            &bytes,
            &BincodeDecoder,
        )?))
    }
}
