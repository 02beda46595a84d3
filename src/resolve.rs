// src/resolve.rs
//
// Generic resolution: closing open type terms against a chained generic
// context. All construction goes through the shared arena, whose intern
// map doubles as the memo table, so resolving the same (definition,
// argument) pair twice always yields the same id.

use rustc_hash::FxHashMap;

use crate::arena::{Ty, TypeId, TypeIdVec};
use crate::errors::Error;
use crate::identity::NameId;
use crate::store::{MethodId, SigParam, SymbolGraph};

/// Two-layer substitution context. Method-specialization bindings shadow
/// type-specialization bindings for the same parameter name; a context can
/// chain to a parent for nested scopes.
#[derive(Debug, Clone, Default)]
pub struct GenericContext<'a> {
    type_map: FxHashMap<NameId, TypeId>,
    method_map: FxHashMap<NameId, TypeId>,
    parent: Option<&'a GenericContext<'a>>,
}

impl<'a> GenericContext<'a> {
    pub fn empty() -> GenericContext<'static> {
        GenericContext::default()
    }

    pub fn chained(parent: &'a GenericContext<'a>) -> Self {
        Self {
            type_map: FxHashMap::default(),
            method_map: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    pub fn bind_type(&mut self, param: NameId, ty: TypeId) {
        self.type_map.insert(param, ty);
    }

    pub fn bind_method(&mut self, param: NameId, ty: TypeId) {
        self.method_map.insert(param, ty);
    }

    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
            && self.method_map.is_empty()
            && self.parent.map(|p| p.is_empty()).unwrap_or(true)
    }

    /// Method layer first, then type layer, then the parent chain.
    pub fn lookup(&self, param: NameId) -> Option<TypeId> {
        self.method_map
            .get(&param)
            .or_else(|| self.type_map.get(&param))
            .copied()
            .or_else(|| self.parent.and_then(|p| p.lookup(param)))
    }
}

/// Fully resolved method signature under some context.
#[derive(Debug, Clone)]
pub struct ResolvedSignature {
    pub ret: TypeId,
    pub params: Vec<SigParam>,
}

pub struct Resolver<'g> {
    graph: &'g SymbolGraph,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g SymbolGraph) -> Self {
        Self { graph }
    }

    /// Closes `ty` against `ctx`:
    ///
    /// 1. parameter terms look up the context (absent means unchanged),
    /// 2. arrays and pointers resolve their element and re-wrap, keeping
    ///    rank and pointer shape,
    /// 3. named terms resolve their arguments and re-intern; a bare
    ///    reference to a generic definition is constructed from the
    ///    definition's own parameters, so bindings for unrelated
    ///    parameters never leak in,
    /// 4. anything else is already closed.
    ///
    /// Recursion follows term structure only and never a definition's
    /// back-edges, so self-referential generic shapes terminate.
    pub fn resolve_type(&self, ty: TypeId, ctx: &GenericContext) -> TypeId {
        if ctx.is_empty() {
            return ty;
        }
        match self.graph.arena.get(ty) {
            Ty::Param { name } => ctx.lookup(name).unwrap_or(ty),
            Ty::Array { element, rank } => {
                let resolved = self.resolve_type(element, ctx);
                if resolved == element {
                    ty
                } else {
                    self.graph.arena.array(resolved, rank)
                }
            }
            Ty::Pointer { pointee } => {
                let resolved = self.resolve_type(pointee, ctx);
                if resolved == pointee {
                    ty
                } else {
                    self.graph.arena.pointer(resolved)
                }
            }
            Ty::Named { def, args } => {
                if args.is_empty() {
                    let params = &self.graph.type_def(def).type_params;
                    if params.is_empty() {
                        return ty;
                    }
                    let resolved: TypeIdVec = params
                        .iter()
                        .map(|p| {
                            ctx.lookup(*p)
                                .unwrap_or_else(|| self.graph.arena.param(*p))
                        })
                        .collect();
                    self.graph.arena.named(def, resolved)
                } else {
                    let resolved: TypeIdVec =
                        args.iter().map(|arg| self.resolve_type(*arg, ctx)).collect();
                    if resolved == args {
                        ty
                    } else {
                        self.graph.arena.named(def, resolved)
                    }
                }
            }
        }
    }

    /// Builds the context an instantiated owner implies: the owner's
    /// definition parameters bound to its arguments on the type layer,
    /// plus explicit method arguments on the method layer.
    pub fn context_for(
        &self,
        owner: TypeId,
        method: Option<(MethodId, &[TypeId])>,
    ) -> GenericContext<'static> {
        let mut ctx = GenericContext::empty();
        if let Ty::Named { def, args } = self.graph.arena.get(owner) {
            let params = &self.graph.type_def(def).type_params;
            for (param, arg) in params.iter().zip(args.iter()) {
                ctx.bind_type(*param, *arg);
            }
        }
        if let Some((method, method_args)) = method {
            let params = &self.graph.method_def(method).type_params;
            for (param, arg) in params.iter().zip(method_args.iter()) {
                ctx.bind_method(*param, *arg);
            }
        }
        ctx
    }

    pub fn resolve_signature(&self, method: MethodId, ctx: &GenericContext) -> ResolvedSignature {
        let def = self.graph.method_def(method);
        ResolvedSignature {
            ret: self.resolve_type(def.ret, ctx),
            params: def
                .params
                .iter()
                .map(|param| SigParam {
                    name: param.name,
                    ty: self.resolve_type(param.ty, ctx),
                    mode: param.mode,
                })
                .collect(),
        }
    }

    /// Base type of an instantiated owner, closed under the owner's own
    /// context.
    pub fn base_of(&self, owner: TypeId) -> Option<TypeId> {
        match self.graph.arena.get(owner) {
            Ty::Named { def, .. } => {
                let base = self.graph.type_def(def).base?;
                let ctx = self.context_for(owner, None);
                Some(self.resolve_type(base, &ctx))
            }
            _ => None,
        }
    }

    /// Interfaces of an instantiated owner, closed under its context, in
    /// declaration order.
    pub fn interfaces_of(&self, owner: TypeId) -> Vec<TypeId> {
        match self.graph.arena.get(owner) {
            Ty::Named { def, .. } => {
                let ctx = self.context_for(owner, None);
                self.graph
                    .type_def(def)
                    .interfaces
                    .iter()
                    .map(|iface| self.resolve_type(*iface, &ctx))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// A unit that claims to be closed must not contain parameter terms
    /// anywhere; a survivor is an engine or caller bug, never user error.
    pub fn ensure_closed(&self, ty: TypeId, owner: &str) -> Result<(), Error> {
        if let Some(param) = self.graph.arena.first_param(ty) {
            return Err(Error::UnresolvedGenericParameter {
                owner: owner.to_string(),
                param: self.graph.names.resolve(param).to_string(),
            });
        }
        Ok(())
    }
}
