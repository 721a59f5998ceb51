use thiserror::Error;

use crate::store::StoreError;
use crate::value::Keyword;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The store rejected the schema for a reason other than "already there".
    #[error(
        "schema for partition '{partition}' rejected ({} attributes attempted): {message}",
        attempted.len()
    )]
    Incompatible {
        partition: String,
        attempted: Vec<Keyword>,
        message: String,
    },
    #[error("enum materialization failed for partition '{partition}': {source}")]
    Materialization {
        partition: String,
        #[source]
        source: StoreError,
    },
}
