use thiserror::Error;

use crate::attribute::SemanticType;
use crate::value::{Keyword, TempId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    #[error("{attribute} is not a declared identity attribute")]
    UnknownIdentity { attribute: Keyword },
    #[error("entity {entity} changes undeclared attribute {attribute}")]
    UnknownAttribute { entity: Keyword, attribute: Keyword },
    #[error("cannot generate a {semantic_type:?} identity for new {attribute} entities")]
    IdentityGenerationUnsupported {
        attribute: Keyword,
        semantic_type: SemanticType,
    },
    #[error("identity value {value} is not valid for {attribute}")]
    MalformedIdentity { attribute: Keyword, value: String },
    #[error("value {value} cannot be written to {attribute}")]
    UnsupportedValue { attribute: Keyword, value: String },
    #[error("{attribute} refers to temporary id {temp}, which identifies no entity in the delta")]
    DanglingTempId { attribute: Keyword, temp: TempId },
}
