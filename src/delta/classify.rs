use serde::{Deserialize, Serialize};

use crate::value::{EntityIdent, Value};

use super::EntityDelta;

/// Decides whether an entity without a temporary identifier is new.
///
/// Entities identified by a `TempId` are always new and never reach the
/// policy.
pub trait NewEntityPolicy: Send + Sync {
    fn is_new(&self, ident: &EntityIdent, delta: &EntityDelta) -> bool;
}

/// Only temporary identifiers mark new entities.
#[derive(Clone, Copy, Debug, Default)]
pub struct TempIdsOnly;

impl NewEntityPolicy for TempIdsOnly {
    fn is_new(&self, _ident: &EntityIdent, _delta: &EntityDelta) -> bool {
        false
    }
}

/// Infers newness from the shape of the delta, for callers that present new
/// entities without a temporary identifier.
///
/// An entity is new when its identity attribute changes from nothing to a
/// value, or when its identity arrived wrapped in a reference and every
/// change starts from nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeHeuristic;

impl NewEntityPolicy for ShapeHeuristic {
    fn is_new(&self, ident: &EntityIdent, delta: &EntityDelta) -> bool {
        let identity_created = delta
            .get(&ident.attribute)
            .map(|change| change.before.is_none() && change.after.is_some())
            .unwrap_or(false);
        if identity_created {
            return true;
        }

        let wrapped = matches!(ident.value, Value::Ref(_));
        wrapped && !delta.is_empty() && delta.iter().all(|(_, change)| change.before.is_none())
    }
}

/// Configurable choice of `NewEntityPolicy`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    TempIdsOnly,
    ShapeHeuristic,
}

impl Classification {
    pub fn policy(self) -> &'static dyn NewEntityPolicy {
        match self {
            Classification::TempIdsOnly => &TempIdsOnly,
            Classification::ShapeHeuristic => &ShapeHeuristic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Keyword;

    fn ident(value: Value) -> EntityIdent {
        EntityIdent::new(Keyword::new("account", "id"), value)
    }

    #[test]
    fn temp_ids_only_never_guesses() {
        let delta = EntityDelta::new().set("account/id", Value::Long(5));
        assert!(!TempIdsOnly.is_new(&ident(Value::Long(5)), &delta));
    }

    #[test]
    fn identity_from_nothing_is_new() {
        let delta = EntityDelta::new()
            .set("account/id", Value::Long(5))
            .change("account/name", Some(Value::from("a")), Some(Value::from("b")));
        assert!(ShapeHeuristic.is_new(&ident(Value::Long(5)), &delta));
    }

    #[test]
    fn wrapped_identity_with_only_additions_is_new() {
        let wrapped = Value::reference(Keyword::new("account", "id"), Value::Long(5));
        let delta = EntityDelta::new().set("account/name", "Alice");
        assert!(ShapeHeuristic.is_new(&ident(wrapped), &delta));
    }

    #[test]
    fn plain_identity_with_edits_is_existing() {
        let delta = EntityDelta::new().set("account/name", "Alice");
        assert!(!ShapeHeuristic.is_new(&ident(Value::Long(5)), &delta));

        let wrapped = Value::reference(Keyword::new("account", "id"), Value::Long(5));
        let edit = EntityDelta::new().change(
            "account/name",
            Some(Value::from("a")),
            Some(Value::from("b")),
        );
        assert!(!ShapeHeuristic.is_new(&ident(wrapped), &edit));
    }

    #[test]
    fn classification_deserializes() {
        let c: Classification = serde_json::from_str("\"shape_heuristic\"").unwrap();
        assert_eq!(c, Classification::ShapeHeuristic);
        assert_eq!(Classification::default(), Classification::TempIdsOnly);
    }
}
