//! Form deltas and their compilation into store transactions.
//!
//! ## Example
//!
//! ```ignore
//! use triple_delta::{Delta, DeltaCompiler, EntityDelta, EntityIdent, TempId, TempIdsOnly};
//!
//! let temp = TempId::new();
//! let delta = Delta::new().entity(
//!     EntityIdent::new("account/id".into(), temp),
//!     EntityDelta::new()
//!         .set("account/id", temp)
//!         .set("account/name", "Alice"),
//! );
//!
//! let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta)?;
//! ```

mod classify;
mod compiler;
mod error;
mod ops;

use serde::{Deserialize, Serialize};

use crate::value::{EntityIdent, Keyword, TempId, Value};

pub use classify::{Classification, NewEntityPolicy, ShapeHeuristic, TempIdsOnly};
pub use compiler::{CompiledTx, DeltaCompiler, IdentityGenerator, RandomIdentities};
pub use error::DeltaError;
pub use ops::{EntityRef, TxOp, TxValue};

/// The before/after values of one attribute.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
}

impl Change {
    pub fn new(before: Option<Value>, after: Option<Value>) -> Self {
        Self { before, after }
    }

    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// Attribute changes for one entity, in the order they were recorded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDelta {
    changes: Vec<(Keyword, Change)>,
}

impl EntityDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change, replacing any earlier change to the same attribute.
    pub fn change(
        mut self,
        attribute: impl Into<Keyword>,
        before: Option<Value>,
        after: Option<Value>,
    ) -> Self {
        self.insert(attribute.into(), Change::new(before, after));
        self
    }

    /// Record a change from nothing to `after`.
    pub fn set(self, attribute: impl Into<Keyword>, after: impl Into<Value>) -> Self {
        self.change(attribute, None, Some(after.into()))
    }

    pub fn insert(&mut self, attribute: Keyword, change: Change) {
        match self.changes.iter_mut().find(|(key, _)| *key == attribute) {
            Some((_, existing)) => *existing = change,
            None => self.changes.push((attribute, change)),
        }
    }

    pub fn get(&self, attribute: &Keyword) -> Option<&Change> {
        self.changes
            .iter()
            .find(|(key, _)| key == attribute)
            .map(|(_, change)| change)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, &Change)> {
        self.changes.iter().map(|(key, change)| (key, change))
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A change-set for one or more entities, keyed by entity identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    entries: Vec<(EntityIdent, EntityDelta)>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, ident: EntityIdent, delta: EntityDelta) -> Self {
        self.insert(ident, delta);
        self
    }

    /// Add an entity, replacing any earlier entry with the same identity.
    pub fn insert(&mut self, ident: EntityIdent, delta: EntityDelta) {
        match self.entries.iter_mut().find(|(key, _)| *key == ident) {
            Some((_, existing)) => *existing = delta,
            None => self.entries.push((ident, delta)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityIdent, &EntityDelta)> {
        self.entries.iter().map(|(ident, delta)| (ident, delta))
    }

    /// Every temporary identifier used as an entity identity.
    pub fn temp_ids(&self) -> impl Iterator<Item = (&EntityIdent, TempId)> {
        self.entries
            .iter()
            .filter_map(|(ident, _)| ident.temp_id().map(|t| (ident, t)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
