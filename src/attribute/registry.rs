use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::value::Keyword;

use super::{AttributeDeclaration, AttributeError, SemanticType};

struct Inner {
    declarations: Vec<AttributeDeclaration>,
    by_key: HashMap<Keyword, usize>,
}

/// Immutable, validated collection of attribute declarations.
///
/// Loaded once at process start. Clone-friendly via Arc.
#[derive(Clone)]
pub struct AttributeRegistry {
    inner: Arc<Inner>,
}

impl AttributeRegistry {
    pub fn new(declarations: Vec<AttributeDeclaration>) -> Result<Self, AttributeError> {
        let mut by_key = HashMap::with_capacity(declarations.len());

        for (idx, decl) in declarations.iter().enumerate() {
            if by_key.insert(decl.key.clone(), idx).is_some() {
                return Err(AttributeError::Duplicate {
                    key: decl.key.clone(),
                });
            }
            if decl.schema.is_empty() {
                return Err(AttributeError::MissingPartition {
                    key: decl.key.clone(),
                });
            }
            if decl.native_id
                && !matches!(decl.semantic_type, SemanticType::Long | SemanticType::Int)
            {
                return Err(AttributeError::NativeIdType {
                    key: decl.key.clone(),
                    semantic_type: decl.semantic_type,
                });
            }
            if !decl.enumerated_values.is_empty() && !decl.is_enum() {
                return Err(AttributeError::EnumValuesOnNonEnum {
                    key: decl.key.clone(),
                });
            }
        }

        for decl in &declarations {
            for identity in &decl.identities {
                let known = by_key
                    .get(identity)
                    .map(|idx| declarations[*idx].identity)
                    .unwrap_or(false);
                if !known {
                    return Err(AttributeError::UnknownIdentity {
                        key: decl.key.clone(),
                        identity: identity.clone(),
                    });
                }
            }
        }

        Ok(Self {
            inner: Arc::new(Inner {
                declarations,
                by_key,
            }),
        })
    }

    /// Load declarations from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let declarations: Vec<AttributeDeclaration> = serde_json::from_str(json)?;
        Self::new(declarations).map_err(serde::de::Error::custom)
    }

    pub fn get(&self, key: &Keyword) -> Option<&AttributeDeclaration> {
        self.inner
            .by_key
            .get(key)
            .map(|idx| &self.inner.declarations[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDeclaration> {
        self.inner.declarations.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &AttributeDeclaration> {
        self.iter().filter(|decl| decl.identity)
    }

    /// The identity attribute itself plus every attribute it owns.
    pub fn owned_by(&self, identity: &Keyword) -> Vec<&AttributeDeclaration> {
        self.iter()
            .filter(|decl| &decl.key == identity || decl.identities.contains(identity))
            .collect()
    }

    pub fn in_partition<'a>(
        &'a self,
        partition: &'a str,
    ) -> impl Iterator<Item = &'a AttributeDeclaration> + 'a {
        self.iter().filter(move |decl| decl.schema == partition)
    }

    pub fn partitions(&self) -> BTreeSet<&str> {
        self.iter().map(|decl| decl.schema.as_str()).collect()
    }

    /// Whether `key` is an identity attribute backed by store entity ids.
    pub fn is_native_identity(&self, key: &Keyword) -> bool {
        self.get(key).map(|d| d.is_native_identity()).unwrap_or(false)
    }

    pub fn is_enum(&self, key: &Keyword) -> bool {
        self.get(key).map(|d| d.is_enum()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.declarations.is_empty()
    }
}
