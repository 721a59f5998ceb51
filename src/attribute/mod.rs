//! Attribute declarations - the declarative metadata that drives schema
//! generation, delta compilation and resolver generation.
//!
//! ## Example
//!
//! ```ignore
//! use triple_delta::{AttributeDeclaration, AttributeRegistry, SemanticType};
//!
//! let registry = AttributeRegistry::new(vec![
//!     AttributeDeclaration::new("account/id", SemanticType::Uuid)
//!         .identity()
//!         .partition("production"),
//!     AttributeDeclaration::new("account/name", SemanticType::String)
//!         .owned_by("account/id")
//!         .partition("production"),
//! ])?;
//! ```

mod error;
mod registry;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::schema::SchemaEntry;
use crate::value::Keyword;

pub use error::AttributeError;
pub use registry::AttributeRegistry;

/// The semantic type of an attribute as seen by the form framework.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Password,
    Boolean,
    Int,
    Long,
    Double,
    Float,
    Bigdec,
    Instant,
    Keyword,
    Symbol,
    Uuid,
    Ref,
    Tuple,
    Enum,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

fn default_true() -> bool {
    true
}

/// Declarative metadata for one attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDeclaration {
    pub key: Keyword,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// True for identity attributes (the key of an entity type).
    #[serde(default)]
    pub identity: bool,
    /// Identity keys of the entity types this attribute belongs to.
    #[serde(default)]
    pub identities: BTreeSet<Keyword>,
    /// Name of the schema partition that stores this attribute.
    pub schema: String,
    /// Use the store's internal entity id as the identity value.
    #[serde(default)]
    pub native_id: bool,
    #[serde(default)]
    pub enumerated_values: Vec<Keyword>,
    /// Merged on top of the generated schema entry.
    #[serde(default)]
    pub schema_override: SchemaEntry,
    #[serde(default = "default_true")]
    pub generate_resolver: bool,
}

impl AttributeDeclaration {
    pub fn new(key: impl Into<Keyword>, semantic_type: SemanticType) -> Self {
        Self {
            key: key.into(),
            semantic_type,
            cardinality: Cardinality::One,
            identity: false,
            identities: BTreeSet::new(),
            schema: String::new(),
            native_id: false,
            enumerated_values: Vec::new(),
            schema_override: SchemaEntry::default(),
            generate_resolver: true,
        }
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }

    pub fn owned_by(mut self, identity: impl Into<Keyword>) -> Self {
        self.identities.insert(identity.into());
        self
    }

    pub fn partition(mut self, name: &str) -> Self {
        self.schema = name.to_string();
        self
    }

    pub fn native_id(mut self) -> Self {
        self.native_id = true;
        self
    }

    pub fn enum_values<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Keyword>,
    {
        self.enumerated_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn schema_override(mut self, entry: SchemaEntry) -> Self {
        self.schema_override = entry;
        self
    }

    pub fn without_resolver(mut self) -> Self {
        self.generate_resolver = false;
        self
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }

    pub fn is_enum(&self) -> bool {
        self.semantic_type == SemanticType::Enum
    }

    pub fn is_ref(&self) -> bool {
        self.semantic_type == SemanticType::Ref
    }

    /// Identity attributes that rely on the store's entity ids.
    pub fn is_native_identity(&self) -> bool {
        self.identity && self.native_id
    }
}
