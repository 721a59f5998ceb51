//! Values flowing between form deltas, transactions and pulled records.

mod keyword;
mod temp_id;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use keyword::{builtin, Keyword};
pub use temp_id::TempId;

/// A pulled entity record: attribute key to value.
pub type EntityData = BTreeMap<Keyword, Value>;

/// A domain or store value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Boolean(bool),
    Long(i64),
    Double(f64),
    /// Arbitrary precision decimal kept in its textual form.
    BigDec(String),
    /// Milliseconds since the Unix epoch.
    Instant(i64),
    Keyword(Keyword),
    Symbol(String),
    Uuid(Uuid),
    TempId(TempId),
    /// A reference to another entity by its identity.
    Ref(Box<EntityIdent>),
    Tuple(Vec<Value>),
    /// The values of a cardinality-many attribute.
    Many(Vec<Value>),
    /// A nested (joined) entity record.
    Map(EntityData),
}

impl Value {
    pub fn is_temp_id(&self) -> bool {
        matches!(self, Value::TempId(_))
    }

    pub fn as_temp_id(&self) -> Option<TempId> {
        match self {
            Value::TempId(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&Keyword> {
        match self {
            Value::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&EntityData> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_ref_ident(&self) -> Option<&EntityIdent> {
        match self {
            Value::Ref(ident) => Some(ident),
            _ => None,
        }
    }

    /// Shorthand for an ident-shaped reference value.
    pub fn reference(attribute: Keyword, value: Value) -> Self {
        Value::Ref(Box::new(EntityIdent::new(attribute, value)))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<TempId> for Value {
    fn from(value: TempId) -> Self {
        Value::TempId(value)
    }
}

impl From<Keyword> for Value {
    fn from(value: Keyword) -> Self {
        Value::Keyword(value)
    }
}

/// The identity of an entity: its identity attribute and current value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityIdent {
    pub attribute: Keyword,
    pub value: Value,
}

impl EntityIdent {
    pub fn new(attribute: Keyword, value: impl Into<Value>) -> Self {
        Self {
            attribute,
            value: value.into(),
        }
    }

    pub fn temp_id(&self) -> Option<TempId> {
        self.value.as_temp_id()
    }
}
