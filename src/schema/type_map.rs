use serde::{Deserialize, Serialize};

use crate::attribute::SemanticType;

/// Value types understood by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreValueType {
    String,
    Boolean,
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
}

/// Map an attribute's semantic type to the store value type that holds it.
///
/// Enums are stored as references to their materialized ident entities.
pub fn store_type_for(semantic_type: SemanticType) -> StoreValueType {
    match semantic_type {
        SemanticType::String | SemanticType::Password => StoreValueType::String,
        SemanticType::Boolean => StoreValueType::Boolean,
        SemanticType::Int | SemanticType::Long => StoreValueType::Long,
        SemanticType::Double => StoreValueType::Double,
        SemanticType::Float => StoreValueType::Float,
        SemanticType::Bigdec => StoreValueType::Bigdec,
        SemanticType::Instant => StoreValueType::Instant,
        SemanticType::Keyword => StoreValueType::Keyword,
        SemanticType::Symbol => StoreValueType::Symbol,
        SemanticType::Uuid => StoreValueType::Uuid,
        SemanticType::Ref | SemanticType::Enum => StoreValueType::Ref,
        SemanticType::Tuple => StoreValueType::Tuple,
    }
}
