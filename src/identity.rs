// src/identity.rs
//
// Interned names and namespace chains for managed symbol identities, plus
// the cleaned spellings used when those identities surface as native
// identifiers or file names.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(u32);

impl NamespaceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a type definition: namespace chain, simple name, and generic
/// arity. `List<T>` and a non-generic `List` in the same namespace are
/// distinct definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub namespace: NamespaceId,
    pub name: NameId,
    pub arity: u8,
}

#[derive(Debug, Clone)]
struct NamespaceChain {
    segments: Vec<NameId>,
}

/// Owner of every interned name and namespace chain in a run. Both symbol
/// providers intern through the same table, so equal managed names compare
/// equal by id no matter which provider produced them.
#[derive(Debug)]
pub struct NameTable {
    names: Vec<String>,
    name_lookup: FxHashMap<String, NameId>,
    namespaces: Vec<NamespaceChain>,
    namespace_lookup: FxHashMap<Vec<NameId>, NamespaceId>,
    root_namespace: NamespaceId,
}

impl NameTable {
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::new(),
            name_lookup: FxHashMap::default(),
            namespaces: Vec::new(),
            namespace_lookup: FxHashMap::default(),
            root_namespace: NamespaceId(0),
        };
        let root = table.namespace_of_segments(&[]);
        table.root_namespace = root;
        table
    }

    pub fn root_namespace(&self) -> NamespaceId {
        self.root_namespace
    }

    pub fn intern(&mut self, text: &str) -> NameId {
        if let Some(id) = self.name_lookup.get(text) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(text.to_string());
        self.name_lookup.insert(text.to_string(), id);
        id
    }

    pub fn resolve(&self, id: NameId) -> &str {
        &self.names[id.index()]
    }

    pub fn name_id_if_known(&self, text: &str) -> Option<NameId> {
        self.name_lookup.get(text).copied()
    }

    /// Interns a dotted namespace path such as `System.Collections.Generic`.
    /// The empty string is the root namespace.
    pub fn namespace(&mut self, dotted: &str) -> NamespaceId {
        if dotted.is_empty() {
            return self.root_namespace;
        }
        let segments: Vec<NameId> = dotted.split('.').map(|s| self.intern(s)).collect();
        self.namespace_of_segments(&segments)
    }

    fn namespace_of_segments(&mut self, segments: &[NameId]) -> NamespaceId {
        if let Some(id) = self.namespace_lookup.get(segments) {
            return *id;
        }
        let id = NamespaceId(self.namespaces.len() as u32);
        self.namespaces.push(NamespaceChain {
            segments: segments.to_vec(),
        });
        self.namespace_lookup.insert(segments.to_vec(), id);
        id
    }

    pub fn namespace_segments(&self, id: NamespaceId) -> &[NameId] {
        &self.namespaces[id.index()].segments
    }

    pub fn namespace_id_if_known(&self, segments: &[NameId]) -> Option<NamespaceId> {
        self.namespace_lookup.get(segments).copied()
    }

    pub fn namespace_display(&self, id: NamespaceId) -> String {
        let chain = &self.namespaces[id.index()];
        let mut out = String::new();
        for (idx, segment) in chain.segments.iter().enumerate() {
            if idx > 0 {
                out.push('.');
            }
            out.push_str(self.resolve(*segment));
        }
        out
    }

    /// Dotted display of a type key, e.g. `System.Collections.Generic.List`.
    /// Arity is not part of the display.
    pub fn type_key_display(&self, key: TypeKey) -> String {
        let namespace = self.namespace_display(key.namespace);
        if namespace.is_empty() {
            self.resolve(key.name).to_string()
        } else {
            format!("{}.{}", namespace, self.resolve(key.name))
        }
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrites a managed name so every character is legal in a native
/// identifier, keeping the result readable: generic brackets, pointers and
/// array markers map to distinct letters so `List<T*>[]` and `List<T>`
/// cannot collide after cleaning by punctuation loss alone.
pub fn clean_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '.' | ':' | '-' | ',' => '_',
            '<' => 'G',
            '>' => 'C',
            '*' => 'P',
            '[' => 'A',
            ']' => 'Y',
            '&' => 'R',
            '(' => 'F',
            ')' => 'N',
            '{' => 'C',
            '}' => 'Y',
            '$' => 'D',
            '=' => 'E',
            '`' => 'T',
            other => other,
        })
        .collect()
}

/// File-name flavor of [`clean_name`]: every special character becomes an
/// underscore. Used for on-disk paths, where letter substitution would only
/// hurt readability.
pub fn clean_name_all_underscore(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | ':' | '<' | '>' | '-' | ',' | '*' | '[' | ']' | '&' | '(' | ')' | '{' | '}'
            | '$' | '=' => '_',
            other => other,
        })
        .collect()
}
