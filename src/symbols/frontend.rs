// src/symbols/frontend.rs
//
// Symbol provider over a source-level symbol graph: the JSON document a
// language frontend exports after its own semantic pass. Unlike the
// metadata image this model is a direct tree, with qualified names spelled
// inline.

use serde::{Deserialize, Serialize};

use super::{AssemblyIdentity, SourceType, SymbolSource};
use crate::errors::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceModel {
    pub assembly: AssemblyIdentity,
    #[serde(default)]
    pub types: Vec<SourceType>,
}

impl SourceModel {
    pub fn from_json(origin: &str, text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|err| Error::MetadataDecode {
            assembly: origin.to_string(),
            detail: err.to_string(),
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct FrontendProvider {
    model: SourceModel,
}

impl FrontendProvider {
    pub fn new(model: SourceModel) -> Self {
        Self { model }
    }

    pub fn from_json(origin: &str, text: &str) -> Result<Self, Error> {
        Ok(Self::new(SourceModel::from_json(origin, text)?))
    }
}

impl SymbolSource for FrontendProvider {
    fn assembly(&self) -> AssemblyIdentity {
        self.model.assembly.clone()
    }

    fn type_count(&self) -> usize {
        self.model.types.len()
    }

    fn type_at(&self, index: usize) -> SourceType {
        self.model.types[index].clone()
    }
}
