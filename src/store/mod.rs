//! Store interface - the public surface of the embedded triple store this
//! crate compiles against, plus an in-memory backend.
//!
//! A `Store` opens one `Connection` per schema partition. A connection
//! applies transactions atomically and hands out immutable `Database`
//! snapshots for reads.

mod error;
mod in_memory;

use std::collections::HashMap;

use crate::delta::TxOp;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::tempid::AllocatedId;
use crate::value::{EntityData, Keyword, Value};

pub use error::StoreError;
pub use in_memory::{InMemoryConnection, InMemoryDatabase, InMemoryStore};

/// The store's internal entity id. Never negative.
pub type EntityId = i64;

/// Outcome of a committed transaction.
#[derive(Clone, Debug)]
pub struct TxResult<D> {
    /// Allocated temporary ids to the entity ids they resolved to.
    pub tempids: HashMap<AllocatedId, EntityId>,
    /// Snapshot of the database right after the commit.
    pub db_after: D,
}

/// Opens connections to named partitions.
pub trait Store: Send + Sync {
    type Connection: Connection;

    /// Open (or reopen) the database for `partition`. A new database is
    /// created with `schema`; an existing one is returned untouched and the
    /// caller is expected to bring its schema up to date.
    fn connect(&self, partition: &str, schema: &Schema) -> Result<Self::Connection, StoreError>;
}

/// An open connection to one partition.
pub trait Connection: Send + Sync {
    type Db: Database;

    fn partition(&self) -> &str;

    /// Take an immutable snapshot of the current state.
    fn db(&self) -> Result<Self::Db, StoreError>;

    /// Apply `ops` atomically: either all of them land or none do.
    fn transact(&self, ops: &[TxOp]) -> Result<TxResult<Self::Db>, StoreError>;

    /// Add `schema` to the existing schema in place.
    fn update_schema(&self, schema: &Schema) -> Result<(), StoreError>;

    fn close(&self) -> Result<(), StoreError>;
}

/// An immutable, point-in-time view of one partition.
pub trait Database: Clone + Send + Sync {
    /// Pull `selection` from entity `eid`. `None` when the entity has no
    /// attributes at all.
    fn pull(&self, eid: EntityId, selection: &Selection) -> Result<Option<EntityData>, StoreError>;

    /// Resolve each `(attribute, value)` pair to an entity id in one pass.
    /// The result is aligned index-for-index with `values`.
    fn lookup_many(
        &self,
        attribute: &Keyword,
        values: &[Value],
    ) -> Result<Vec<Option<EntityId>>, StoreError>;

    /// Every value currently asserted for `attribute`.
    fn values_of(&self, attribute: &Keyword) -> Result<Vec<Value>, StoreError>;

    /// Every entity id that has at least one attribute.
    fn entity_ids(&self) -> Result<Vec<EntityId>, StoreError>;

    fn lookup(&self, attribute: &Keyword, value: &Value) -> Result<Option<EntityId>, StoreError> {
        let found = self.lookup_many(attribute, std::slice::from_ref(value))?;
        Ok(found.into_iter().next().flatten())
    }
}
