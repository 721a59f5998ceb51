use thiserror::Error;

use crate::schema::StoreValueType;
use crate::value::Keyword;

use super::EntityId;

/// Errors reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("connection to partition '{partition}' is closed")]
    Closed { partition: String },
    #[error("attribute {attribute} is not in the schema")]
    UnknownAttribute { attribute: Keyword },
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),
    #[error("lookup [{attribute} {value}] matched no entity")]
    LookupNotFound { attribute: Keyword, value: String },
    #[error("value {found} does not fit {attribute} of type {expected:?}")]
    TypeMismatch {
        attribute: Keyword,
        expected: StoreValueType,
        found: String,
    },
    #[error("unique conflict on {attribute}: {value} already asserted by another entity")]
    UniqueConflict { attribute: Keyword, value: String },
    #[error("schema conflict on {attribute}: {message}")]
    SchemaConflict { attribute: Keyword, message: String },
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// A failure worth retrying (contention, timeouts in the backend).
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}
