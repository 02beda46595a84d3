// src/arena.rs
//
// Interned type terms. The arena hands out stable TypeId handles for
// structurally deduplicated terms, which makes it the memo table for
// generic instantiation: constructing the same (definition, arguments)
// pair twice yields the same handle, so downstream passes compare resolved
// types by id.

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::identity::NameId;
use crate::store::TypeDefId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub type TypeIdVec = SmallVec<[TypeId; 4]>;

/// A type term. `Named` with an empty argument list is a reference to a
/// non-generic definition; with arguments it is a constructed (possibly
/// still open) instantiation. Generic parameters are identified by name
/// alone, so a method parameter can shadow a type parameter spelled the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Named { def: TypeDefId, args: TypeIdVec },
    Array { element: TypeId, rank: u8 },
    Pointer { pointee: TypeId },
    Param { name: NameId },
}

impl Ty {
    pub fn is_param(&self) -> bool {
        matches!(self, Ty::Param { .. })
    }
}

#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<Ty>,
    intern_map: HashMap<Ty, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn lookup(&self, ty: &Ty) -> Option<TypeId> {
        self.intern_map.get(ty).copied()
    }

    pub fn intern(&mut self, ty: Ty) -> TypeId {
        if let Some(id) = self.intern_map.get(&ty) {
            return *id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.intern_map.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Ty {
        &self.types[id.index()]
    }

    pub fn named(&mut self, def: TypeDefId, args: TypeIdVec) -> TypeId {
        self.intern(Ty::Named { def, args })
    }

    pub fn array(&mut self, element: TypeId, rank: u8) -> TypeId {
        self.intern(Ty::Array { element, rank })
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(Ty::Pointer { pointee })
    }

    pub fn param(&mut self, name: NameId) -> TypeId {
        self.intern(Ty::Param { name })
    }

    /// True if any parameter term occurs anywhere inside `id`.
    pub fn contains_param(&self, id: TypeId) -> bool {
        match self.get(id) {
            Ty::Param { .. } => true,
            Ty::Array { element, .. } => self.contains_param(*element),
            Ty::Pointer { pointee } => self.contains_param(*pointee),
            Ty::Named { args, .. } => args.iter().any(|arg| self.contains_param(*arg)),
        }
    }

    /// First parameter name occurring inside `id`, if any. Used for error
    /// reporting when a closed unit turns out not to be closed.
    pub fn first_param(&self, id: TypeId) -> Option<NameId> {
        match self.get(id) {
            Ty::Param { name } => Some(*name),
            Ty::Array { element, .. } => self.first_param(*element),
            Ty::Pointer { pointee } => self.first_param(*pointee),
            Ty::Named { args, .. } => args.iter().find_map(|arg| self.first_param(*arg)),
        }
    }
}

/// Arena shared across the parallel emission phase. Reads are concurrent;
/// interning is a double-checked get-or-insert under the write lock, so two
/// threads racing to construct the same term observe the same id (first
/// writer wins).
#[derive(Debug, Default)]
pub struct SharedArena {
    inner: RwLock<TypeArena>,
}

impl SharedArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, ty: Ty) -> TypeId {
        if let Some(id) = self.inner.read().lookup(&ty) {
            return id;
        }
        self.inner.write().intern(ty)
    }

    /// Terms are small (ids and a SmallVec), so lookups hand out clones
    /// rather than holding the read lock across caller code.
    pub fn get(&self, id: TypeId) -> Ty {
        self.inner.read().get(id).clone()
    }

    pub fn named(&self, def: TypeDefId, args: TypeIdVec) -> TypeId {
        self.intern(Ty::Named { def, args })
    }

    pub fn array(&self, element: TypeId, rank: u8) -> TypeId {
        self.intern(Ty::Array { element, rank })
    }

    pub fn pointer(&self, pointee: TypeId) -> TypeId {
        self.intern(Ty::Pointer { pointee })
    }

    pub fn param(&self, name: NameId) -> TypeId {
        self.intern(Ty::Param { name })
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains_param(&self, id: TypeId) -> bool {
        self.inner.read().contains_param(id)
    }

    pub fn first_param(&self, id: TypeId) -> Option<NameId> {
        self.inner.read().first_param(id)
    }
}
