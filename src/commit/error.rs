use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::delta::DeltaError;
use crate::registry::RegistryError;
use crate::store::StoreError;
use crate::value::{TempId, Value};

/// Why a save failed.
///
/// The commit variants carry `committed`: the tempids of partitions that
/// committed before the failing one. Those writes stay in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    #[error(transparent)]
    Delta(#[from] DeltaError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("commit of {op_count} ops to partition '{partition}' failed: {source}")]
    Commit {
        partition: String,
        op_count: usize,
        committed: HashMap<TempId, Value>,
        #[source]
        source: StoreError,
    },
    #[error("commit to partition '{partition}' gave up after {attempts} attempts in {elapsed:?}")]
    CommitTimeout {
        partition: String,
        attempts: u32,
        elapsed: Duration,
        committed: HashMap<TempId, Value>,
    },
}

impl SaveError {
    /// Tempids that were committed before the save failed, if any were.
    pub fn committed(&self) -> Option<&HashMap<TempId, Value>> {
        match self {
            SaveError::Commit { committed, .. } | SaveError::CommitTimeout { committed, .. } => {
                Some(committed).filter(|map| !map.is_empty())
            }
            _ => None,
        }
    }

    pub(crate) fn with_committed(mut self, tempids: HashMap<TempId, Value>) -> Self {
        if let SaveError::Commit { committed, .. } | SaveError::CommitTimeout { committed, .. } =
            &mut self
        {
            committed.extend(tempids);
        }
        self
    }
}
