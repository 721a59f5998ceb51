//! InMemoryStore - HashMap-backed triple store for testing and embedding.
//!
//! Each partition is an `Arc<DbState>` behind a lock. A transaction clones
//! the current state, applies every op to the clone and swaps it in only if
//! all ops succeeded, so readers holding an older snapshot never observe a
//! partial write.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::delta::{EntityRef, TxOp, TxValue};
use crate::schema::{Schema, SchemaEntry, StoreValueType, Unique};
use crate::selection::{Selection, SelectionItem};
use crate::tempid::AllocatedId;
use crate::value::{builtin, EntityData, Keyword, Value};

use super::{Connection, Database, EntityId, Store, StoreError, TxResult};

#[derive(Clone, Debug, PartialEq)]
enum Datom {
    Scalar(Value),
    Ref(EntityId),
}

#[derive(Clone, Debug)]
struct DbState {
    schema: Schema,
    entities: BTreeMap<EntityId, BTreeMap<Keyword, Vec<Datom>>>,
    next_eid: EntityId,
    basis_t: u64,
}

impl DbState {
    fn new(schema: &Schema) -> Self {
        let mut schema = schema.clone();
        schema.insert(
            builtin::db_ident(),
            SchemaEntry {
                value_type: Some(StoreValueType::Keyword),
                unique: Some(Unique::Identity),
                ..Default::default()
            },
        );
        Self {
            schema,
            entities: BTreeMap::new(),
            next_eid: 1,
            basis_t: 0,
        }
    }

    fn entry(&self, attribute: &Keyword) -> Result<&SchemaEntry, StoreError> {
        self.schema
            .get(attribute)
            .ok_or_else(|| StoreError::UnknownAttribute {
                attribute: attribute.clone(),
            })
    }

    fn find_by(&self, attribute: &Keyword, datom: &Datom) -> Option<EntityId> {
        self.entities.iter().find_map(|(eid, attrs)| {
            attrs
                .get(attribute)
                .filter(|datoms| datoms.contains(datom))
                .map(|_| *eid)
        })
    }

    fn pull(&self, eid: EntityId, selection: &Selection) -> Option<EntityData> {
        let attrs = self.entities.get(&eid)?;
        let mut out = EntityData::new();

        for item in selection.items() {
            let (key, nested) = match item {
                SelectionItem::Field(key) => (key, None),
                SelectionItem::Join(key, nested) => (key, Some(nested)),
            };
            if *key == builtin::db_id() {
                out.insert(key.clone(), Value::Long(eid));
                continue;
            }
            if let Some(datoms) = attrs.get(key) {
                out.insert(key.clone(), self.render(key, datoms, nested));
            }
        }

        Some(out)
    }

    fn render(&self, attribute: &Keyword, datoms: &[Datom], nested: Option<&Selection>) -> Value {
        let mut values = datoms.iter().map(|datom| match datom {
            Datom::Scalar(value) => value.clone(),
            Datom::Ref(target) => match nested {
                Some(nested) => Value::Map(self.pull(*target, nested).unwrap_or_default()),
                None => {
                    let mut stub = EntityData::new();
                    stub.insert(builtin::db_id(), Value::Long(*target));
                    Value::Map(stub)
                }
            },
        });

        let many = self
            .schema
            .get(attribute)
            .map(|entry| entry.is_many())
            .unwrap_or(false);
        if many {
            Value::Many(values.collect())
        } else {
            values.next().unwrap_or(Value::Many(Vec::new()))
        }
    }
}

type SharedState = Arc<RwLock<Arc<DbState>>>;

/// In-memory store holding one database per partition.
///
/// Clone-friendly (cloning shares the same underlying databases), so a
/// partition reopened through any clone sees the data written earlier.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    databases: Arc<RwLock<HashMap<String, SharedState>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every partition opened so far.
    pub fn partitions(&self) -> Result<Vec<String>, StoreError> {
        let databases = self
            .databases
            .read()
            .map_err(|_| StoreError::LockPoisoned("partition list"))?;
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl Store for InMemoryStore {
    type Connection = InMemoryConnection;

    fn connect(&self, partition: &str, schema: &Schema) -> Result<InMemoryConnection, StoreError> {
        let mut databases = self
            .databases
            .write()
            .map_err(|_| StoreError::LockPoisoned("connect"))?;

        let state = databases
            .entry(partition.to_string())
            .or_insert_with(|| {
                tracing::debug!(target: "triple_delta::store", partition, "creating database");
                Arc::new(RwLock::new(Arc::new(DbState::new(schema))))
            })
            .clone();

        Ok(InMemoryConnection {
            partition: partition.to_string(),
            state,
            closed: AtomicBool::new(false),
        })
    }
}

/// Connection to one in-memory partition.
pub struct InMemoryConnection {
    partition: String,
    state: SharedState,
    closed: AtomicBool,
}

impl InMemoryConnection {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed {
                partition: self.partition.clone(),
            });
        }
        Ok(())
    }
}

impl Connection for InMemoryConnection {
    type Db = InMemoryDatabase;

    fn partition(&self) -> &str {
        &self.partition
    }

    fn db(&self) -> Result<InMemoryDatabase, StoreError> {
        self.ensure_open()?;
        let current = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot"))?;
        Ok(InMemoryDatabase {
            state: Arc::clone(&current),
        })
    }

    fn transact(&self, ops: &[TxOp]) -> Result<TxResult<InMemoryDatabase>, StoreError> {
        self.ensure_open()?;
        let mut current = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("transact"))?;

        let mut next = DbState::clone(&current);
        let tempids = Transaction::new(&mut next).apply(ops)?;
        next.basis_t += 1;

        let next = Arc::new(next);
        *current = Arc::clone(&next);

        Ok(TxResult {
            tempids,
            db_after: InMemoryDatabase { state: next },
        })
    }

    fn update_schema(&self, schema: &Schema) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut current = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("update schema"))?;

        let mut next = DbState::clone(&current);
        let mut changed = false;

        for (attribute, entry) in schema {
            match next.schema.get_mut(attribute) {
                Some(existing) if existing == entry => {}
                Some(existing) => {
                    if existing.value_type != entry.value_type
                        || existing.cardinality != entry.cardinality
                        || existing.unique != entry.unique
                    {
                        return Err(StoreError::SchemaConflict {
                            attribute: attribute.clone(),
                            message: format!(
                                "existing definition {:?} differs from {:?}",
                                existing, entry
                            ),
                        });
                    }
                    existing.extra.extend(entry.extra.clone());
                    changed = true;
                }
                None => {
                    next.schema.insert(attribute.clone(), entry.clone());
                    changed = true;
                }
            }
        }

        if !changed {
            return Err(StoreError::AlreadyExists(
                "schema is identical to the installed schema".into(),
            ));
        }

        *current = Arc::new(next);
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Immutable snapshot of one partition.
#[derive(Clone, Debug)]
pub struct InMemoryDatabase {
    state: Arc<DbState>,
}

impl InMemoryDatabase {
    /// Number of transactions applied before this snapshot was taken.
    pub fn basis_t(&self) -> u64 {
        self.state.basis_t
    }

    pub fn schema(&self) -> &Schema {
        &self.state.schema
    }
}

impl Database for InMemoryDatabase {
    fn pull(&self, eid: EntityId, selection: &Selection) -> Result<Option<EntityData>, StoreError> {
        Ok(self.state.pull(eid, selection))
    }

    fn lookup_many(
        &self,
        attribute: &Keyword,
        values: &[Value],
    ) -> Result<Vec<Option<EntityId>>, StoreError> {
        let mut found = vec![None; values.len()];

        for (eid, attrs) in &self.state.entities {
            let Some(datoms) = attrs.get(attribute) else {
                continue;
            };
            for datom in datoms {
                let Datom::Scalar(stored) = datom else {
                    continue;
                };
                for (slot, wanted) in found.iter_mut().zip(values) {
                    if slot.is_none() && stored == wanted {
                        *slot = Some(*eid);
                    }
                }
            }
        }

        Ok(found)
    }

    fn values_of(&self, attribute: &Keyword) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .state
            .entities
            .values()
            .filter_map(|attrs| attrs.get(attribute))
            .flatten()
            .map(|datom| match datom {
                Datom::Scalar(value) => value.clone(),
                Datom::Ref(eid) => Value::Long(*eid),
            })
            .collect())
    }

    fn entity_ids(&self) -> Result<Vec<EntityId>, StoreError> {
        Ok(self.state.entities.keys().copied().collect())
    }
}

/// Applies ops to a private copy of the state.
struct Transaction<'a> {
    state: &'a mut DbState,
    tempids: HashMap<AllocatedId, EntityId>,
}

impl<'a> Transaction<'a> {
    fn new(state: &'a mut DbState) -> Self {
        Self {
            state,
            tempids: HashMap::new(),
        }
    }

    fn apply(mut self, ops: &[TxOp]) -> Result<HashMap<AllocatedId, EntityId>, StoreError> {
        // New entities that assert an existing unique-identity value upsert
        // onto that entity instead of creating a duplicate.
        for op in ops {
            if let TxOp::Upsert {
                entity: EntityRef::Temp(allocated),
                writes,
            } = op
            {
                if self.tempids.contains_key(allocated) {
                    continue;
                }
                if let Some(eid) = self.upsert_target(writes)? {
                    self.tempids.insert(*allocated, eid);
                }
            }
        }

        for op in ops {
            match op {
                TxOp::Upsert { entity, writes } => {
                    let eid = self.resolve(entity)?;
                    self.state.entities.entry(eid).or_default();
                    for (attribute, value) in writes {
                        self.assert(eid, attribute, value)?;
                    }
                }
                TxOp::Retract {
                    entity,
                    attribute,
                    value,
                } => {
                    let eid = self.resolve(entity)?;
                    self.retract(eid, attribute, value)?;
                }
                TxOp::RetractEntity { entity } => {
                    let eid = self.resolve(entity)?;
                    self.retract_entity(eid);
                }
            }
        }

        self.state.entities.retain(|_, attrs| !attrs.is_empty());
        let entities = &self.state.entities;
        self.tempids.retain(|_, eid| entities.contains_key(eid));
        Ok(self.tempids)
    }

    fn upsert_target(
        &self,
        writes: &BTreeMap<Keyword, TxValue>,
    ) -> Result<Option<EntityId>, StoreError> {
        for (attribute, value) in writes {
            let entry = self.state.entry(attribute)?;
            if entry.unique != Some(Unique::Identity) {
                continue;
            }
            if let TxValue::Scalar(value) = value {
                let datom = Datom::Scalar(value.clone());
                if let Some(eid) = self.state.find_by(attribute, &datom) {
                    return Ok(Some(eid));
                }
            }
        }
        Ok(None)
    }

    fn resolve(&mut self, entity: &EntityRef) -> Result<EntityId, StoreError> {
        match entity {
            EntityRef::Temp(allocated) => {
                if let Some(eid) = self.tempids.get(allocated) {
                    return Ok(*eid);
                }
                let eid = self.state.next_eid;
                self.state.next_eid += 1;
                self.tempids.insert(*allocated, eid);
                Ok(eid)
            }
            EntityRef::Id(eid) => {
                if self.state.entities.contains_key(eid) {
                    Ok(*eid)
                } else {
                    Err(StoreError::UnknownEntity(*eid))
                }
            }
            EntityRef::Lookup { attribute, value } => self
                .state
                .find_by(attribute, &Datom::Scalar(value.clone()))
                .ok_or_else(|| StoreError::LookupNotFound {
                    attribute: attribute.clone(),
                    value: format!("{:?}", value),
                }),
            EntityRef::Ident(ident) => {
                let attribute = builtin::db_ident();
                self.state
                    .find_by(&attribute, &Datom::Scalar(Value::Keyword(ident.clone())))
                    .ok_or_else(|| StoreError::LookupNotFound {
                        attribute,
                        value: ident.to_string(),
                    })
            }
        }
    }

    fn datoms(&mut self, attribute: &Keyword, value: &TxValue) -> Result<Vec<Datom>, StoreError> {
        let entry = self.state.entry(attribute)?.clone();

        match value {
            TxValue::Many(values) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    out.extend(self.datoms(attribute, value)?);
                }
                Ok(out)
            }
            TxValue::Ref(target) => {
                if !entry.is_ref() {
                    return Err(mismatch(attribute, &entry, &format!("{:?}", target)));
                }
                Ok(vec![Datom::Ref(self.resolve(target)?)])
            }
            TxValue::Scalar(Value::Many(values)) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    out.extend(self.datoms(attribute, &TxValue::Scalar(value.clone()))?);
                }
                Ok(out)
            }
            TxValue::Scalar(value) if entry.is_ref() => {
                let target = match value {
                    Value::Keyword(ident) => EntityRef::Ident(ident.clone()),
                    Value::Long(eid) => EntityRef::Id(*eid),
                    Value::Ref(ident) => {
                        EntityRef::lookup(ident.attribute.clone(), ident.value.clone())
                    }
                    other => return Err(mismatch(attribute, &entry, &format!("{:?}", other))),
                };
                Ok(vec![Datom::Ref(self.resolve(&target)?)])
            }
            TxValue::Scalar(value) => {
                if let Some(expected) = entry.value_type {
                    if !fits(expected, value) {
                        return Err(mismatch(attribute, &entry, &format!("{:?}", value)));
                    }
                }
                Ok(vec![Datom::Scalar(value.clone())])
            }
        }
    }

    fn assert(
        &mut self,
        eid: EntityId,
        attribute: &Keyword,
        value: &TxValue,
    ) -> Result<(), StoreError> {
        let datoms = self.datoms(attribute, value)?;
        let entry = self.state.entry(attribute)?;
        let many = entry.is_many();

        if entry.unique.is_some() {
            for datom in &datoms {
                if let Some(other) = self.state.find_by(attribute, datom) {
                    if other != eid {
                        return Err(StoreError::UniqueConflict {
                            attribute: attribute.clone(),
                            value: format!("{:?}", datom),
                        });
                    }
                }
            }
        }

        let attrs = self.state.entities.entry(eid).or_default();
        let stored = attrs.entry(attribute.clone()).or_default();
        if many {
            for datom in datoms {
                if !stored.contains(&datom) {
                    stored.push(datom);
                }
            }
        } else if let Some(last) = datoms.into_iter().last() {
            *stored = vec![last];
        }
        if stored.is_empty() {
            attrs.remove(attribute);
        }
        Ok(())
    }

    fn retract(
        &mut self,
        eid: EntityId,
        attribute: &Keyword,
        value: &TxValue,
    ) -> Result<(), StoreError> {
        let datoms = self.datoms(attribute, value)?;
        if let Some(attrs) = self.state.entities.get_mut(&eid) {
            if let Some(stored) = attrs.get_mut(attribute) {
                stored.retain(|datom| !datoms.contains(datom));
                if stored.is_empty() {
                    attrs.remove(attribute);
                }
            }
        }
        Ok(())
    }

    fn retract_entity(&mut self, eid: EntityId) {
        self.state.entities.remove(&eid);
        let dangling = Datom::Ref(eid);
        for attrs in self.state.entities.values_mut() {
            for stored in attrs.values_mut() {
                stored.retain(|datom| *datom != dangling);
            }
            attrs.retain(|_, stored| !stored.is_empty());
        }
    }
}

fn fits(expected: StoreValueType, value: &Value) -> bool {
    matches!(
        (expected, value),
        (StoreValueType::String, Value::String(_))
            | (StoreValueType::Boolean, Value::Boolean(_))
            | (StoreValueType::Long, Value::Long(_))
            | (StoreValueType::Double | StoreValueType::Float, Value::Double(_))
            | (StoreValueType::Bigdec, Value::BigDec(_))
            | (StoreValueType::Instant, Value::Instant(_))
            | (StoreValueType::Keyword, Value::Keyword(_))
            | (StoreValueType::Symbol, Value::Symbol(_))
            | (StoreValueType::Uuid, Value::Uuid(_))
            | (StoreValueType::Tuple, Value::Tuple(_))
    )
}

fn mismatch(attribute: &Keyword, entry: &SchemaEntry, found: &str) -> StoreError {
    StoreError::TypeMismatch {
        attribute: attribute.clone(),
        expected: entry.value_type.unwrap_or(StoreValueType::Ref),
        found: found.to_string(),
    }
}
