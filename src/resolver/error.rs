use thiserror::Error;

use crate::registry::RegistryError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    /// The caller must paginate or raise `max_batch_size`.
    #[error("batch of {requested} ids exceeds the maximum of {max}")]
    BatchTooLarge { requested: usize, max: usize },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
