// src/lower.rs
//
// Seam for the statement-level lowering collaborator. This crate
// synthesizes declarations and structure; method bodies arrive pre-lowered
// from whatever drives the translation, or not at all, in which case stub
// definitions are emitted under impl/ for hand-completion.

use crate::errors::Error;
use crate::resolve::GenericContext;
use crate::store::{MethodId, SymbolGraph};

/// Opaque reference into the collaborator's body storage, carried through
/// from the symbol input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u32);

/// One pre-lowered native statement. The emitter prints it verbatim at the
/// current indent.
#[derive(Debug, Clone)]
pub struct Statement(String);

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoweredBody {
    statements: Vec<Statement>,
}

impl LoweredBody {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

pub trait BodyLowering {
    /// Returns the lowered body for `method` under `ctx`, `None` when the
    /// collaborator has no body for it (declaration plus stub is emitted
    /// instead). Failures surface with the method's identity attached.
    fn lower(
        &self,
        graph: &SymbolGraph,
        method: MethodId,
        ctx: &GenericContext,
    ) -> Result<Option<LoweredBody>, Error>;
}

/// Default collaborator: every method is body-less.
#[derive(Debug, Default)]
pub struct NoLowering;

impl BodyLowering for NoLowering {
    fn lower(
        &self,
        _graph: &SymbolGraph,
        _method: MethodId,
        _ctx: &GenericContext,
    ) -> Result<Option<LoweredBody>, Error> {
        Ok(None)
    }
}
