use crate::attribute::{AttributeDeclaration, AttributeRegistry};
use crate::registry::RequestEnv;
use crate::selection::Selection;
use crate::store::Database;
use crate::value::{EntityData, Keyword, Value};

use super::{Resolver, ResolverError, ResolverSignature};

/// Lists every existing entity of one type as `{<ns>/all: [{identity: v}]}`.
///
/// Native-id types have no attribute to scan, so every entity carrying at
/// least one attribute the type owns is reported.
pub struct AllIdsResolver {
    identity: AttributeDeclaration,
    owned: Selection,
    output: Keyword,
    signature: ResolverSignature,
}

impl AllIdsResolver {
    pub fn new(identity: &AttributeDeclaration, attributes: &AttributeRegistry) -> Self {
        let namespace = identity.key.namespace().unwrap_or(identity.key.as_str());
        let output = Keyword::new(namespace, "all");
        let owned = Selection::fields(
            attributes
                .owned_by(&identity.key)
                .into_iter()
                .filter(|decl| decl.key != identity.key && !decl.native_id)
                .map(|decl| decl.key.clone()),
        );

        Self {
            identity: identity.clone(),
            owned,
            output: output.clone(),
            signature: ResolverSignature {
                name: format!("{}-all", identity.key.as_str()),
                inputs: Vec::new(),
                outputs: vec![output],
                batch: false,
            },
        }
    }

    fn ids<D: Database>(&self, db: &D) -> Result<Vec<Value>, ResolverError> {
        if !self.identity.native_id {
            return Ok(db.values_of(&self.identity.key)?);
        }

        let mut ids = Vec::new();
        for eid in db.entity_ids()? {
            let owns_something = db
                .pull(eid, &self.owned)?
                .map(|data| !data.is_empty())
                .unwrap_or(false);
            if owns_something {
                ids.push(Value::Long(eid));
            }
        }
        Ok(ids)
    }
}

impl<D: Database> Resolver<D> for AllIdsResolver {
    fn signature(&self) -> &ResolverSignature {
        &self.signature
    }

    fn resolve(
        &self,
        env: &RequestEnv<D>,
        _inputs: &[Value],
        _selection: &Selection,
    ) -> Result<Vec<EntityData>, ResolverError> {
        let db = env.db(&self.identity.schema)?;
        let entities = self
            .ids(db)?
            .into_iter()
            .map(|id| {
                let mut entity = EntityData::new();
                entity.insert(self.identity.key.clone(), id);
                Value::Map(entity)
            })
            .collect();

        let mut row = EntityData::new();
        row.insert(self.output.clone(), Value::Many(entities));
        Ok(vec![row])
    }
}
