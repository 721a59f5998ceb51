use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error(
        "no connection registered for partition '{partition}' (available: {})",
        available.join(", ")
    )]
    MissingConnection {
        partition: String,
        available: Vec<String>,
    },
    #[error("failed to open partition '{partition}': {source}")]
    Open {
        partition: String,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to snapshot partition '{partition}': {source}")]
    Snapshot {
        partition: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to close partition '{partition}': {source}")]
    Close {
        partition: String,
        #[source]
        source: StoreError,
    },
}
