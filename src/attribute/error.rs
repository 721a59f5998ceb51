use thiserror::Error;

use crate::value::Keyword;

use super::SemanticType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute {key} is declared more than once")]
    Duplicate { key: Keyword },
    #[error("native-id attribute {key} must be of type long or int, got {semantic_type:?}")]
    NativeIdType {
        key: Keyword,
        semantic_type: SemanticType,
    },
    #[error("attribute {key} declares enumerated values but is not an enum")]
    EnumValuesOnNonEnum { key: Keyword },
    #[error("attribute {key} has no schema partition")]
    MissingPartition { key: Keyword },
    #[error("attribute {key} is owned by unknown identity {identity}")]
    UnknownIdentity { key: Keyword, identity: Keyword },
}
