use std::collections::BTreeMap;

use crate::store::EntityId;
use crate::tempid::AllocatedId;
use crate::value::{Keyword, Value};

/// How a transaction names the entity it touches.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityRef {
    /// An entity created by this transaction.
    Temp(AllocatedId),
    /// An existing entity found through a unique attribute.
    Lookup { attribute: Keyword, value: Value },
    /// An existing entity by store id.
    Id(EntityId),
    /// An entity carrying a `db/ident` (materialized enum values).
    Ident(Keyword),
}

impl EntityRef {
    pub fn lookup(attribute: Keyword, value: Value) -> Self {
        EntityRef::Lookup { attribute, value }
    }
}

/// A value written by a transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum TxValue {
    Scalar(Value),
    Ref(EntityRef),
    Many(Vec<TxValue>),
}

/// One operation of a compiled transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum TxOp {
    /// Assert `writes` on `entity`, creating it when it is new.
    Upsert {
        entity: EntityRef,
        writes: BTreeMap<Keyword, TxValue>,
    },
    /// Remove one value of one attribute.
    Retract {
        entity: EntityRef,
        attribute: Keyword,
        value: TxValue,
    },
    /// Remove an entity and every reference to it.
    RetractEntity { entity: EntityRef },
}

impl TxOp {
    pub fn entity(&self) -> &EntityRef {
        match self {
            TxOp::Upsert { entity, .. }
            | TxOp::Retract { entity, .. }
            | TxOp::RetractEntity { entity } => entity,
        }
    }

    pub fn is_upsert(&self) -> bool {
        matches!(self, TxOp::Upsert { .. })
    }

    pub fn is_retract(&self) -> bool {
        matches!(self, TxOp::Retract { .. })
    }
}
