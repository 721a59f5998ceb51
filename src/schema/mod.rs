//! Schema generation - derive a store schema from attribute declarations and
//! bring an existing store up to date with it.

mod compiler;
mod error;
mod type_map;
mod update;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attribute::Cardinality;
use crate::value::Keyword;

pub use compiler::{compile_schema, enum_ident, enum_records, EnumRecord};
pub use error::SchemaError;
pub use type_map::{store_type_for, StoreValueType};
pub use update::{ensure_schema, is_benign_schema_error, materialize_enums};

/// Attribute key to schema entry, for one partition.
pub type Schema = BTreeMap<Keyword, SchemaEntry>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unique {
    /// Unique, and upserts resolve to the existing entity.
    Identity,
    /// Unique, and duplicates are rejected.
    Value,
}

/// The schema of one attribute. Every field is optional so that the same
/// shape doubles as a partial override.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<StoreValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<Unique>,
    /// Store-specific options (indexing, fulltext, ...) passed through as-is.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SchemaEntry {
    pub fn is_empty(&self) -> bool {
        self.value_type.is_none()
            && self.cardinality.is_none()
            && self.unique.is_none()
            && self.extra.is_empty()
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Some(Cardinality::Many)
    }

    pub fn is_ref(&self) -> bool {
        self.value_type == Some(StoreValueType::Ref)
    }

    /// Lay `overrides` on top of `self`; the override wins on every key it sets.
    pub fn merge(mut self, overrides: &SchemaEntry) -> Self {
        if overrides.value_type.is_some() {
            self.value_type = overrides.value_type;
        }
        if overrides.cardinality.is_some() {
            self.cardinality = overrides.cardinality;
        }
        if overrides.unique.is_some() {
            self.unique = overrides.unique;
        }
        for (key, value) in &overrides.extra {
            self.extra.insert(key.clone(), value.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entry_is_empty() {
        assert!(SchemaEntry::default().is_empty());
    }

    #[test]
    fn merge_prefers_override() {
        let generated = SchemaEntry {
            value_type: Some(StoreValueType::String),
            unique: Some(Unique::Identity),
            ..Default::default()
        };
        let overrides = SchemaEntry {
            unique: Some(Unique::Value),
            extra: [("fulltext".to_string(), serde_json::json!(true))]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let merged = generated.merge(&overrides);
        assert_eq!(merged.value_type, Some(StoreValueType::String));
        assert_eq!(merged.unique, Some(Unique::Value));
        assert_eq!(merged.extra["fulltext"], serde_json::json!(true));
    }

    #[test]
    fn extra_options_flatten_in_json() {
        let entry: SchemaEntry =
            serde_json::from_str(r#"{ "value_type": "string", "index": true }"#).unwrap();
        assert_eq!(entry.value_type, Some(StoreValueType::String));
        assert_eq!(entry.extra["index"], serde_json::json!(true));
    }
}
