use crate::attribute::{AttributeDeclaration, AttributeRegistry};
use crate::config::Config;
use crate::registry::RequestEnv;
use crate::selection::{Selection, SelectionItem};
use crate::store::Database;
use crate::value::{builtin, EntityData, Keyword, Value};

use super::enums::deref_enums;
use super::native_id::rewrite_native_ids;
use super::{Resolver, ResolverError, ResolverSignature};

/// Fetches entity data for a batch of identity values in one pass.
///
/// The output is aligned with the input batch; ids that match nothing yield
/// an empty record.
pub struct IdentityResolver {
    identity: AttributeDeclaration,
    attributes: AttributeRegistry,
    max_batch_size: usize,
    batch_warn_threshold: usize,
    signature: ResolverSignature,
}

impl IdentityResolver {
    pub fn new(
        identity: &AttributeDeclaration,
        attributes: &AttributeRegistry,
        config: &Config,
    ) -> Self {
        let outputs = attributes
            .owned_by(&identity.key)
            .into_iter()
            .map(|decl| decl.key.clone())
            .collect();

        Self {
            identity: identity.clone(),
            attributes: attributes.clone(),
            max_batch_size: config.max_batch_size,
            batch_warn_threshold: config.batch_warn_threshold,
            signature: ResolverSignature {
                name: format!("{}-resolver", identity.key.as_str()),
                inputs: vec![identity.key.clone()],
                outputs,
                batch: true,
            },
        }
    }

    /// The selection actually sent to the store: native identities become
    /// `db/id` and enum fields are joined to their ident.
    fn pull_selection(&self, selection: &Selection) -> Selection {
        let mut pull = self.rewrite(selection);
        if self.identity.native_id && !pull.contains(&builtin::db_id()) {
            pull.push(SelectionItem::Field(builtin::db_id()));
        }
        pull
    }

    fn rewrite(&self, selection: &Selection) -> Selection {
        selection
            .items()
            .iter()
            .map(|item| match item {
                SelectionItem::Field(key) if self.attributes.is_native_identity(key) => {
                    SelectionItem::Field(builtin::db_id())
                }
                SelectionItem::Field(key) if self.attributes.is_enum(key) => SelectionItem::Join(
                    key.clone(),
                    Selection::fields([builtin::db_ident()]),
                ),
                SelectionItem::Field(key) => SelectionItem::Field(key.clone()),
                SelectionItem::Join(key, nested) => {
                    SelectionItem::Join(key.clone(), self.rewrite(nested))
                }
            })
            .collect()
    }

    fn fetch<D: Database>(
        &self,
        db: &D,
        inputs: &[Value],
        pull: &Selection,
    ) -> Result<Vec<EntityData>, ResolverError> {
        if self.identity.native_id {
            let mut rows = Vec::with_capacity(inputs.len());
            for input in inputs {
                let row = match input.as_long() {
                    Some(eid) => db.pull(eid, pull)?.unwrap_or_default(),
                    None => EntityData::new(),
                };
                rows.push(row);
            }
            return Ok(rows);
        }

        let eids = db.lookup_many(&self.identity.key, inputs)?;
        let mut rows = Vec::with_capacity(inputs.len());
        for (input, eid) in inputs.iter().zip(eids) {
            let pulled = match eid {
                Some(eid) => db.pull(eid, pull)?,
                None => None,
            };
            let row = match pulled {
                Some(mut data) => {
                    data.insert(self.identity.key.clone(), input.clone());
                    data
                }
                None => EntityData::new(),
            };
            rows.push(row);
        }
        Ok(rows)
    }
}

impl<D: Database> Resolver<D> for IdentityResolver {
    fn signature(&self) -> &ResolverSignature {
        &self.signature
    }

    fn resolve(
        &self,
        env: &RequestEnv<D>,
        inputs: &[Value],
        selection: &Selection,
    ) -> Result<Vec<EntityData>, ResolverError> {
        if inputs.len() > self.max_batch_size {
            return Err(ResolverError::BatchTooLarge {
                requested: inputs.len(),
                max: self.max_batch_size,
            });
        }
        if inputs.len() > self.batch_warn_threshold {
            tracing::warn!(
                target: "triple_delta::resolver",
                resolver = %self.signature.name,
                batch = inputs.len(),
                threshold = self.batch_warn_threshold,
                "large resolver batch"
            );
        }

        let db = env.db(&self.identity.schema)?;
        let pull = self.pull_selection(selection);
        let mut rows = self.fetch(db, inputs, &pull)?;

        let has_enums = selection.any_key(&|key: &Keyword| self.attributes.is_enum(key));
        let has_native =
            selection.any_key(&|key: &Keyword| self.attributes.is_native_identity(key));
        for row in rows.iter_mut().filter(|row| !row.is_empty()) {
            if has_enums {
                deref_enums(row, selection, &self.attributes);
            }
            if has_native {
                rewrite_native_ids(row, selection, &self.attributes);
            }
            if self.identity.native_id {
                if let Some(id) = row.remove(&builtin::db_id()) {
                    row.insert(self.identity.key.clone(), id);
                }
            }
        }

        tracing::debug!(
            target: "triple_delta::resolver",
            resolver = %self.signature.name,
            batch = inputs.len(),
            found = rows.iter().filter(|row| !row.is_empty()).count(),
            "resolved batch"
        );
        Ok(rows)
    }
}
