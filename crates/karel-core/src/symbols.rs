use std::collections::HashMap;

/// Mapping from procedure name to bytecode entry offset.
///
/// The table owns its key storage. Entries are written during load and
/// cleared wholesale on reload; keys are unique (the compiler reports a
/// duplicate definition before it reaches the table).
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a bytecode entry offset, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, pc: u32) {
        self.entries.insert(name.into(), pc);
    }

    /// Resolve a name to its entry offset.
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over `(name, entry_pc)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, &pc)| (name.as_str(), pc))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
