//! Symbol table: variable name to storage slot.
//!
//! Octa has a single scope, so the table only grows. Declaration order is
//! kept for diagnostics and dumps.

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct SymbolTable<S> {
    slots: IndexMap<String, S>,
}

impl<S: Copy> SymbolTable<S> {
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Bind `name` to `slot`, returning the previous slot if the name was
    /// already bound.
    pub fn bind(&mut self, name: impl Into<String>, slot: S) -> Option<S> {
        self.slots.insert(name.into(), slot)
    }

    pub fn lookup(&self, name: &str) -> Option<S> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Declared names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

impl<S: Copy> Default for SymbolTable<S> {
    fn default() -> Self {
        Self::new()
    }
}
