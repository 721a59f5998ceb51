use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client-generated placeholder for an entity that has no permanent
/// identity yet.
///
/// Backed by a random UUID, so it never equals a real attribute value and
/// two placeholders only compare equal when they are the same placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TempId(Uuid);

impl TempId {
    pub fn new() -> Self {
        TempId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        TempId(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tempid:{}", self.0)
    }
}
