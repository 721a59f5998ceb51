//! Temporary-identifier allocation.
//!
//! Every allocated id comes from one process-wide counter that only ever
//! decrements, so two allocations never share a value no matter how many
//! compiles run concurrently. A `TempIdScope` memoizes allocations for the
//! length of one compile so the same `TempId` always maps to the same
//! `AllocatedId` inside it.

mod scope;

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

pub use scope::TempIdScope;

/// First value handed out. Store entity ids are never negative; starting
/// this far below zero leaves room for stores that reserve small negative
/// ids of their own. At one allocation per nanosecond the counter would
/// need centuries to reach `i64::MIN`.
const ALLOCATION_SEED: i64 = -(1 << 40);

static NEXT_ALLOCATED: AtomicI64 = AtomicI64::new(ALLOCATION_SEED);

/// A transaction-local stand-in for an entity that does not exist yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AllocatedId(i64);

impl AllocatedId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AllocatedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Take the next id from the process-wide counter.
pub fn allocate() -> AllocatedId {
    AllocatedId(NEXT_ALLOCATED.fetch_sub(1, Ordering::Relaxed))
}
