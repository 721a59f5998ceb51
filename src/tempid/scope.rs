use std::collections::HashMap;

use crate::value::TempId;

use super::{allocate, AllocatedId};

/// Allocation memo for a single compile.
///
/// Not shared between compiles: each compile owns its scope and drops it
/// once the commit result has been mapped.
#[derive(Debug, Default)]
pub struct TempIdScope {
    ids: HashMap<TempId, AllocatedId>,
}

impl TempIdScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// The allocated id for `temp_id`, allocating on first use.
    pub fn allocate(&mut self, temp_id: TempId) -> AllocatedId {
        *self.ids.entry(temp_id).or_insert_with(allocate)
    }

    /// A fresh id that no `TempId` maps to.
    pub fn allocate_anonymous(&mut self) -> AllocatedId {
        allocate()
    }

    pub fn get(&self, temp_id: &TempId) -> Option<AllocatedId> {
        self.ids.get(temp_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TempId, &AllocatedId)> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
