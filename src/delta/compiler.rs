use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::attribute::{AttributeDeclaration, AttributeRegistry, SemanticType};
use crate::schema::enum_ident;
use crate::tempid::{AllocatedId, TempIdScope};
use crate::value::{EntityIdent, Keyword, TempId, Value};

use super::{Change, Delta, DeltaError, EntityDelta, EntityRef, NewEntityPolicy, TxOp, TxValue};

/// Produces identity values for new entities.
pub trait IdentityGenerator: Send + Sync {
    fn generate(&self, identity: &AttributeDeclaration) -> Result<Value, DeltaError>;
}

/// Random v4 UUIDs for uuid identities, and their text for string ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdentities;

impl IdentityGenerator for RandomIdentities {
    fn generate(&self, identity: &AttributeDeclaration) -> Result<Value, DeltaError> {
        match identity.semantic_type {
            SemanticType::Uuid => Ok(Value::Uuid(Uuid::new_v4())),
            SemanticType::String => Ok(Value::String(Uuid::new_v4().to_string())),
            semantic_type => Err(DeltaError::IdentityGenerationUnsupported {
                attribute: identity.key.clone(),
                semantic_type,
            }),
        }
    }
}

/// A compiled transaction together with the allocations it made.
#[derive(Debug)]
pub struct CompiledTx {
    /// Upserts first, then retractions, each in delta order.
    pub ops: Vec<TxOp>,
    /// Needed to map the commit result back to temporary identifiers.
    pub scope: TempIdScope,
}

impl CompiledTx {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Compiles deltas into transaction ops.
pub struct DeltaCompiler<'a> {
    registry: &'a AttributeRegistry,
    policy: &'a dyn NewEntityPolicy,
    generator: &'a dyn IdentityGenerator,
}

impl<'a> DeltaCompiler<'a> {
    pub fn new(registry: &'a AttributeRegistry, policy: &'a dyn NewEntityPolicy) -> Self {
        Self {
            registry,
            policy,
            generator: &RandomIdentities,
        }
    }

    pub fn with_generator(mut self, generator: &'a dyn IdentityGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Compile `delta` in a fresh allocation scope.
    pub fn compile(&self, delta: &Delta) -> Result<CompiledTx, DeltaError> {
        let mut alloc = Allocations::new(delta);
        let mut upserts = Vec::new();
        let mut retractions = Vec::new();

        // Every entity is classified before any is compiled, so a reference
        // to an entity judged new resolves the same way wherever it appears.
        let mut targets = Vec::with_capacity(delta.len());
        for (ident, entity_delta) in delta.iter() {
            targets.push(self.classify(ident, entity_delta, &mut alloc)?);
        }
        for ((ident, entity_delta), target) in delta.iter().zip(targets) {
            self.compile_entity(
                ident,
                entity_delta,
                target,
                &mut alloc,
                &mut upserts,
                &mut retractions,
            )?;
        }

        tracing::debug!(
            target: "triple_delta::delta",
            entities = delta.len(),
            upserts = upserts.len(),
            retractions = retractions.len(),
            "compiled delta"
        );

        upserts.append(&mut retractions);
        Ok(CompiledTx {
            ops: upserts,
            scope: alloc.scope,
        })
    }

    /// A single op removing the entity `ident` names.
    pub fn compile_delete(&self, ident: &EntityIdent) -> Result<TxOp, DeltaError> {
        let identity = self.identity(&ident.attribute)?;
        let value = unwrap_identity(ident);
        Ok(TxOp::RetractEntity {
            entity: existing_ref(identity, value)?,
        })
    }

    fn identity(&self, attribute: &Keyword) -> Result<&'a AttributeDeclaration, DeltaError> {
        self.registry
            .get(attribute)
            .filter(|decl| decl.identity)
            .ok_or_else(|| DeltaError::UnknownIdentity {
                attribute: attribute.clone(),
            })
    }

    /// The entity ref an entity's ops target, and whether it is new.
    fn classify(
        &self,
        ident: &EntityIdent,
        delta: &EntityDelta,
        alloc: &mut Allocations,
    ) -> Result<(EntityRef, bool), DeltaError> {
        let identity = self.identity(&ident.attribute)?;
        let current = unwrap_identity(ident);

        match current.as_temp_id() {
            Some(temp) => Ok((EntityRef::Temp(alloc.scope.allocate(temp)), true)),
            None if self.policy.is_new(ident, delta) => {
                let allocated = alloc.scope.allocate_anonymous();
                alloc
                    .inferred
                    .push((identity.key.clone(), current.clone(), allocated));
                Ok((EntityRef::Temp(allocated), true))
            }
            None => Ok((existing_ref(identity, current)?, false)),
        }
    }

    fn compile_entity(
        &self,
        ident: &EntityIdent,
        delta: &EntityDelta,
        (entity, is_new): (EntityRef, bool),
        alloc: &mut Allocations,
        upserts: &mut Vec<TxOp>,
        retractions: &mut Vec<TxOp>,
    ) -> Result<(), DeltaError> {
        let identity = self.identity(&ident.attribute)?;
        let current = unwrap_identity(ident);

        let mut writes = BTreeMap::new();
        if is_new && !identity.native_id {
            let value = self.new_identity_value(identity, current, delta)?;
            writes.insert(identity.key.clone(), TxValue::Scalar(value));
        }

        let mut removed = Vec::new();
        for (attribute, change) in delta.iter() {
            if *attribute == identity.key || change.is_noop() {
                continue;
            }
            let decl = self
                .registry
                .get(attribute)
                .ok_or_else(|| DeltaError::UnknownAttribute {
                    entity: identity.key.clone(),
                    attribute: attribute.clone(),
                })?;
            if decl.native_id {
                continue;
            }
            self.compile_change(decl, change, alloc, &mut writes, &mut removed)?;
        }

        if !writes.is_empty() {
            upserts.push(TxOp::Upsert {
                entity: entity.clone(),
                writes,
            });
        }
        retractions.extend(removed.into_iter().map(|(attribute, value)| TxOp::Retract {
            entity: entity.clone(),
            attribute,
            value,
        }));
        Ok(())
    }

    fn new_identity_value(
        &self,
        identity: &AttributeDeclaration,
        current: &Value,
        delta: &EntityDelta,
    ) -> Result<Value, DeltaError> {
        if !current.is_temp_id() {
            return Ok(current.clone());
        }
        // A client may already have chosen the permanent value.
        match delta.get(&identity.key).and_then(|change| change.after.as_ref()) {
            Some(value) if !value.is_temp_id() => Ok(value.clone()),
            _ => self.generator.generate(identity),
        }
    }

    fn compile_change(
        &self,
        decl: &AttributeDeclaration,
        change: &Change,
        alloc: &mut Allocations,
        writes: &mut BTreeMap<Keyword, TxValue>,
        removed: &mut Vec<(Keyword, TxValue)>,
    ) -> Result<(), DeltaError> {
        match (&change.before, &change.after) {
            (Some(Value::Many(before)), Some(Value::Many(after))) => {
                let added: Vec<&Value> = after.iter().filter(|v| !before.contains(v)).collect();
                if !added.is_empty() {
                    let values = added
                        .into_iter()
                        .map(|v| self.tx_value(decl, v, alloc))
                        .collect::<Result<Vec<_>, _>>()?;
                    writes.insert(decl.key.clone(), TxValue::Many(values));
                }
                for value in before.iter().filter(|v| !after.contains(v)) {
                    removed.push((decl.key.clone(), self.tx_value(decl, value, alloc)?));
                }
            }
            (_, Some(after)) => {
                writes.insert(decl.key.clone(), self.tx_value(decl, after, alloc)?);
            }
            (Some(Value::Many(before)), None) => {
                for value in before {
                    removed.push((decl.key.clone(), self.tx_value(decl, value, alloc)?));
                }
            }
            (Some(before), None) => {
                removed.push((decl.key.clone(), self.tx_value(decl, before, alloc)?));
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn tx_value(
        &self,
        decl: &AttributeDeclaration,
        value: &Value,
        alloc: &mut Allocations,
    ) -> Result<TxValue, DeltaError> {
        match value {
            Value::Ref(target) => Ok(TxValue::Ref(self.ref_for(decl, target, alloc)?)),
            Value::TempId(temp) => Ok(TxValue::Ref(alloc.temp(&decl.key, *temp)?)),
            Value::Many(values) => values
                .iter()
                .map(|v| self.tx_value(decl, v, alloc))
                .collect::<Result<Vec<_>, _>>()
                .map(TxValue::Many),
            Value::Keyword(k) if decl.is_enum() => {
                Ok(TxValue::Ref(EntityRef::Ident(enum_ident(&decl.key, k))))
            }
            Value::Map(_) => Err(DeltaError::UnsupportedValue {
                attribute: decl.key.clone(),
                value: format!("{:?}", value),
            }),
            other => Ok(TxValue::Scalar(other.clone())),
        }
    }

    fn ref_for(
        &self,
        decl: &AttributeDeclaration,
        target: &EntityIdent,
        alloc: &mut Allocations,
    ) -> Result<EntityRef, DeltaError> {
        let value = unwrap_identity(target);
        if let Some(temp) = value.as_temp_id() {
            return alloc.temp(&decl.key, temp);
        }
        if let Some(allocated) = alloc.inferred(&target.attribute, value) {
            return Ok(EntityRef::Temp(allocated));
        }
        match self.registry.get(&target.attribute) {
            Some(identity) if identity.identity => existing_ref(identity, value),
            _ => Ok(EntityRef::lookup(target.attribute.clone(), value.clone())),
        }
    }
}

/// Allocation state for one compile.
struct Allocations {
    scope: TempIdScope,
    /// Temporary ids that identify an entity of the delta.
    declared: HashSet<TempId>,
    /// Entities the policy judged new, by identity attribute and value.
    inferred: Vec<(Keyword, Value, AllocatedId)>,
}

impl Allocations {
    fn new(delta: &Delta) -> Self {
        Self {
            scope: TempIdScope::new(),
            declared: delta
                .iter()
                .filter_map(|(ident, _)| unwrap_identity(ident).as_temp_id())
                .collect(),
            inferred: Vec::new(),
        }
    }

    /// A reference to `temp`, which must name an entity of the delta. The
    /// store would otherwise commit a ref to an entity that never exists.
    fn temp(&mut self, attribute: &Keyword, temp: TempId) -> Result<EntityRef, DeltaError> {
        if !self.declared.contains(&temp) {
            return Err(DeltaError::DanglingTempId {
                attribute: attribute.clone(),
                temp,
            });
        }
        Ok(EntityRef::Temp(self.scope.allocate(temp)))
    }

    fn inferred(&self, attribute: &Keyword, value: &Value) -> Option<AllocatedId> {
        self.inferred
            .iter()
            .find(|(key, inferred, _)| key == attribute && inferred == value)
            .map(|(_, _, allocated)| *allocated)
    }
}

/// The identity value, with any same-attribute reference wrapping removed.
fn unwrap_identity(ident: &EntityIdent) -> &Value {
    let mut value = &ident.value;
    while let Value::Ref(inner) = value {
        if inner.attribute != ident.attribute {
            break;
        }
        value = &inner.value;
    }
    value
}

fn existing_ref(identity: &AttributeDeclaration, value: &Value) -> Result<EntityRef, DeltaError> {
    if identity.native_id {
        return value
            .as_long()
            .map(EntityRef::Id)
            .ok_or_else(|| DeltaError::MalformedIdentity {
                attribute: identity.key.clone(),
                value: format!("{:?}", value),
            });
    }
    Ok(EntityRef::lookup(identity.key.clone(), value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{ShapeHeuristic, TempIdsOnly};
    use crate::value::TempId;
    use proptest::prelude::*;

    fn kw(s: &str) -> Keyword {
        Keyword::from(s)
    }

    fn registry() -> AttributeRegistry {
        AttributeRegistry::new(vec![
            AttributeDeclaration::new("account/id", SemanticType::Uuid)
                .identity()
                .partition("production"),
            AttributeDeclaration::new("account/name", SemanticType::String)
                .owned_by("account/id")
                .partition("production"),
            AttributeDeclaration::new("account/tags", SemanticType::String)
                .many()
                .owned_by("account/id")
                .partition("production"),
            AttributeDeclaration::new("account/role", SemanticType::Enum)
                .owned_by("account/id")
                .enum_values(["admin", "user"])
                .partition("production"),
            AttributeDeclaration::new("account/addresses", SemanticType::Ref)
                .many()
                .owned_by("account/id")
                .partition("production"),
            AttributeDeclaration::new("address/id", SemanticType::Uuid)
                .identity()
                .partition("production"),
            AttributeDeclaration::new("address/street", SemanticType::String)
                .owned_by("address/id")
                .partition("production"),
            AttributeDeclaration::new("item/id", SemanticType::Long)
                .identity()
                .native_id()
                .partition("production"),
            AttributeDeclaration::new("item/label", SemanticType::String)
                .owned_by("item/id")
                .partition("production"),
            AttributeDeclaration::new("counter/id", SemanticType::Long)
                .identity()
                .partition("production"),
        ])
        .unwrap()
    }

    fn account(value: impl Into<Value>) -> EntityIdent {
        EntityIdent::new(kw("account/id"), value)
    }

    #[test]
    fn new_entity_with_temp_id() {
        let registry = registry();
        let temp = TempId::new();
        let delta = Delta::new().entity(
            account(temp),
            EntityDelta::new().set("account/id", temp).set("account/name", "Alice"),
        );

        let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        assert_eq!(compiled.ops.len(), 1);

        let allocated = compiled.scope.get(&temp).unwrap();
        assert!(allocated.get() < 0);
        match &compiled.ops[0] {
            TxOp::Upsert { entity, writes } => {
                assert_eq!(entity, &EntityRef::Temp(allocated));
                assert_eq!(writes[&kw("account/name")], TxValue::Scalar(Value::from("Alice")));
                assert!(matches!(writes[&kw("account/id")], TxValue::Scalar(Value::Uuid(_))));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn client_chosen_identity_is_kept() {
        let registry = registry();
        let temp = TempId::new();
        let id = Uuid::new_v4();
        let delta = Delta::new().entity(account(temp), EntityDelta::new().set("account/id", id));

        let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        match &compiled.ops[0] {
            TxOp::Upsert { writes, .. } => {
                assert_eq!(writes[&kw("account/id")], TxValue::Scalar(Value::Uuid(id)));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn existing_entity_uses_lookup_ref() {
        let registry = registry();
        let id = Uuid::new_v4();
        let delta = Delta::new().entity(
            account(id),
            EntityDelta::new().change(
                "account/name",
                Some(Value::from("Alice")),
                Some(Value::from("Alicia")),
            ),
        );

        let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        assert_eq!(
            compiled.ops,
            vec![TxOp::Upsert {
                entity: EntityRef::lookup(kw("account/id"), Value::Uuid(id)),
                writes: [(kw("account/name"), TxValue::Scalar(Value::from("Alicia")))]
                    .into_iter()
                    .collect(),
            }]
        );
        assert!(compiled.scope.is_empty());
    }

    #[test]
    fn removal_emits_single_retract() {
        let registry = registry();
        let id = Uuid::new_v4();
        let delta = Delta::new().entity(
            account(id),
            EntityDelta::new().change("account/name", Some(Value::from("X")), None),
        );

        let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        assert_eq!(
            compiled.ops,
            vec![TxOp::Retract {
                entity: EntityRef::lookup(kw("account/id"), Value::Uuid(id)),
                attribute: kw("account/name"),
                value: TxValue::Scalar(Value::from("X")),
            }]
        );
    }

    #[test]
    fn many_valued_changes_are_diffed() {
        let registry = registry();
        let id = Uuid::new_v4();
        let delta = Delta::new().entity(
            account(id),
            EntityDelta::new().change(
                "account/tags",
                Some(Value::Many(vec![Value::from("a"), Value::from("b")])),
                Some(Value::Many(vec![Value::from("b"), Value::from("c")])),
            ),
        );

        let ops = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap().ops;
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            TxOp::Upsert { writes, .. } => assert_eq!(
                writes[&kw("account/tags")],
                TxValue::Many(vec![TxValue::Scalar(Value::from("c"))])
            ),
            other => panic!("unexpected op {:?}", other),
        }
        match &ops[1] {
            TxOp::Retract { value, .. } => assert_eq!(value, &TxValue::Scalar(Value::from("a"))),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn upserts_precede_retractions() {
        let registry = registry();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let delta = Delta::new()
            .entity(
                account(a),
                EntityDelta::new().change("account/name", Some(Value::from("A")), None),
            )
            .entity(account(b), EntityDelta::new().set("account/name", "B"));

        let ops = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap().ops;
        assert!(ops[0].is_upsert());
        assert!(ops[1].is_retract());
    }

    #[test]
    fn references_to_new_entities_share_allocation() {
        let registry = registry();
        let account_temp = TempId::new();
        let address_temp = TempId::new();
        let delta = Delta::new()
            .entity(
                account(account_temp),
                EntityDelta::new().set(
                    "account/addresses",
                    Value::Many(vec![Value::reference(kw("address/id"), address_temp.into())]),
                ),
            )
            .entity(
                EntityIdent::new(kw("address/id"), address_temp),
                EntityDelta::new().set("address/street", "Main St"),
            );

        let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        let address = compiled.scope.get(&address_temp).unwrap();
        match &compiled.ops[0] {
            TxOp::Upsert { writes, .. } => assert_eq!(
                writes[&kw("account/addresses")],
                TxValue::Many(vec![TxValue::Ref(EntityRef::Temp(address))])
            ),
            other => panic!("unexpected op {:?}", other),
        }
        assert_eq!(compiled.ops[1].entity(), &EntityRef::Temp(address));
    }

    #[test]
    fn temp_id_used_only_as_value_is_rejected() {
        let registry = registry();
        let account_temp = TempId::new();
        let orphan = TempId::new();
        let delta = Delta::new().entity(
            account(account_temp),
            EntityDelta::new().set(
                "account/addresses",
                Value::Many(vec![Value::reference(kw("address/id"), orphan.into())]),
            ),
        );

        let err = DeltaCompiler::new(&registry, &TempIdsOnly)
            .compile(&delta)
            .unwrap_err();
        assert_eq!(
            err,
            DeltaError::DanglingTempId {
                attribute: kw("account/addresses"),
                temp: orphan,
            }
        );
    }

    #[test]
    fn heuristic_new_entities_resolve_regardless_of_order() {
        let registry = registry();
        let address_id = Value::Uuid(Uuid::new_v4());
        let account_temp = TempId::new();
        let address = (
            EntityIdent::new(kw("address/id"), address_id.clone()),
            EntityDelta::new()
                .change("address/id", None, Some(address_id.clone()))
                .set("address/street", "Main St"),
        );
        let owner = (
            account(account_temp),
            EntityDelta::new().set(
                "account/addresses",
                Value::Many(vec![Value::reference(kw("address/id"), address_id.clone())]),
            ),
        );

        let forward = Delta::new()
            .entity(address.0.clone(), address.1.clone())
            .entity(owner.0.clone(), owner.1.clone());
        let backward = Delta::new()
            .entity(owner.0, owner.1)
            .entity(address.0, address.1);

        let compiler = DeltaCompiler::new(&registry, &ShapeHeuristic);
        for delta in [forward, backward] {
            let ops = compiler.compile(&delta).unwrap().ops;
            let created = ops
                .iter()
                .find_map(|op| match op {
                    TxOp::Upsert { entity, writes }
                        if writes.contains_key(&kw("address/street")) =>
                    {
                        Some(entity.clone())
                    }
                    _ => None,
                })
                .unwrap();
            assert!(matches!(created, EntityRef::Temp(_)));

            let referenced = ops
                .iter()
                .find_map(|op| match op {
                    TxOp::Upsert { writes, .. } => writes.get(&kw("account/addresses")).cloned(),
                    _ => None,
                })
                .unwrap();
            assert_eq!(referenced, TxValue::Many(vec![TxValue::Ref(created)]));
        }
    }

    #[test]
    fn enum_keywords_become_ident_refs() {
        let registry = registry();
        let delta = Delta::new().entity(
            account(Uuid::new_v4()),
            EntityDelta::new().set("account/role", Keyword::plain("admin")),
        );

        let ops = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap().ops;
        match &ops[0] {
            TxOp::Upsert { writes, .. } => assert_eq!(
                writes[&kw("account/role")],
                TxValue::Ref(EntityRef::Ident(Keyword::new("account.role", "admin")))
            ),
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn native_identity_existing_and_new() {
        let registry = registry();
        let temp = TempId::new();
        let delta = Delta::new()
            .entity(
                EntityIdent::new(kw("item/id"), Value::Long(42)),
                EntityDelta::new().set("item/label", "old"),
            )
            .entity(
                EntityIdent::new(kw("item/id"), temp),
                EntityDelta::new().set("item/label", "new"),
            );

        let compiled = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        assert_eq!(compiled.ops[0].entity(), &EntityRef::Id(42));
        match &compiled.ops[1] {
            TxOp::Upsert { entity, writes } => {
                assert_eq!(entity, &EntityRef::Temp(compiled.scope.get(&temp).unwrap()));
                assert!(!writes.contains_key(&kw("item/id")));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn unsupported_identity_generation_fails() {
        let registry = registry();
        let delta = Delta::new().entity(
            EntityIdent::new(kw("counter/id"), TempId::new()),
            EntityDelta::new(),
        );
        let err = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap_err();
        assert!(matches!(err, DeltaError::IdentityGenerationUnsupported { .. }));
    }

    #[test]
    fn undeclared_attributes_are_rejected() {
        let registry = registry();
        let delta = Delta::new().entity(
            account(Uuid::new_v4()),
            EntityDelta::new().set("account/shoe-size", Value::Long(9)),
        );
        let err = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap_err();
        assert!(matches!(err, DeltaError::UnknownAttribute { .. }));
    }

    #[test]
    fn heuristic_marks_new_without_temp_id() {
        let registry = registry();
        let id = Uuid::new_v4();
        let delta = Delta::new().entity(
            account(id),
            EntityDelta::new().set("account/id", id).set("account/name", "Eve"),
        );

        let strict = DeltaCompiler::new(&registry, &TempIdsOnly).compile(&delta).unwrap();
        assert_eq!(
            strict.ops[0].entity(),
            &EntityRef::lookup(kw("account/id"), Value::Uuid(id))
        );

        let guessed = DeltaCompiler::new(&registry, &ShapeHeuristic).compile(&delta).unwrap();
        match &guessed.ops[0] {
            TxOp::Upsert { entity, writes } => {
                assert!(matches!(entity, EntityRef::Temp(_)));
                assert_eq!(writes[&kw("account/id")], TxValue::Scalar(Value::Uuid(id)));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn compile_delete_targets_existing_entity() {
        let registry = registry();
        let op = DeltaCompiler::new(&registry, &TempIdsOnly)
            .compile_delete(&EntityIdent::new(kw("item/id"), Value::Long(3)))
            .unwrap();
        assert_eq!(op, TxOp::RetractEntity { entity: EntityRef::Id(3) });
    }

    #[test]
    fn independent_compiles_differ_only_in_allocations() {
        let registry = registry();
        let temp = TempId::new();
        let id = Uuid::new_v4();
        let delta = Delta::new().entity(
            account(temp),
            EntityDelta::new().set("account/id", id).set("account/name", "Ann"),
        );
        let compiler = DeltaCompiler::new(&registry, &TempIdsOnly);
        let first = compiler.compile(&delta).unwrap();
        let second = compiler.compile(&delta).unwrap();

        let strip = |ops: &[TxOp]| -> Vec<BTreeMap<Keyword, TxValue>> {
            ops.iter()
                .filter_map(|op| match op {
                    TxOp::Upsert { writes, .. } => Some(writes.clone()),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(strip(&first.ops), strip(&second.ops));
        assert_ne!(first.scope.get(&temp), second.scope.get(&temp));
    }

    proptest! {
        #[test]
        fn unchanged_values_compile_to_nothing(
            names in proptest::collection::vec("[a-z]{1,8}", 1..10)
        ) {
            let registry = registry();
            let mut delta = Delta::new();
            for name in &names {
                delta.insert(
                    account(Uuid::new_v4()),
                    EntityDelta::new().change(
                        "account/name",
                        Some(Value::from(name.as_str())),
                        Some(Value::from(name.as_str())),
                    ),
                );
            }
            let compiled = DeltaCompiler::new(&registry, &ShapeHeuristic).compile(&delta).unwrap();
            prop_assert!(compiled.is_empty());
        }
    }
}
