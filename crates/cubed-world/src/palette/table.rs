//! Indirection table between local palette indices and global ids.

use std::collections::HashMap;

/// Append-only list of global ids plus the reverse lookup, kept in step.
///
/// Id 0 always sits at index 0.
#[derive(Debug, Clone)]
pub(crate) struct IndirectTable {
    ids: Vec<u32>,
    indices: HashMap<u32, u32>,
}

impl IndirectTable {
    pub(crate) fn new() -> Self {
        Self {
            ids: vec![0],
            indices: HashMap::from([(0, 0)]),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub(crate) fn id(&self, index: u32) -> u32 {
        self.ids[index as usize]
    }

    pub(crate) fn index_of(&self, id: u32) -> Option<u32> {
        self.indices.get(&id).copied()
    }

    /// Append `id` and return its new index. `id` must not be present yet.
    pub(crate) fn push(&mut self, id: u32) -> u32 {
        debug_assert!(!self.indices.contains_key(&id), "duplicate palette id {id}");
        let index = self.ids.len() as u32;
        self.ids.push(id);
        self.indices.insert(id, index);
        index
    }

    pub(crate) fn index_or_insert(&mut self, id: u32) -> u32 {
        match self.index_of(id) {
            Some(index) => index,
            None => self.push(id),
        }
    }
}
