//! Commit - submit compiled transactions and map temporary identifiers to
//! the permanent identity values the store assigned.

mod error;
mod mapper;
mod save;

pub use error::SaveError;
pub use mapper::map_tempids;
pub use save::{delete_entity, save_delta, SaveResult};
