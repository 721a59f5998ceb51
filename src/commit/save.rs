use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use serde::Serialize;

use crate::attribute::AttributeRegistry;
use crate::config::Config;
use crate::delta::{CompiledTx, Delta, DeltaCompiler, DeltaError, TxOp};
use crate::registry::ConnectionRegistry;
use crate::store::{Connection, TxResult};
use crate::value::{EntityIdent, TempId, Value};

use super::{map_tempids, SaveError};

/// What a save hands back to the form framework.
///
/// `tempids` is always present, empty when nothing new was created.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SaveResult {
    pub tempids: HashMap<TempId, Value>,
}

/// Compile `delta` and commit it, one transaction per partition.
///
/// Every partition is compiled before any is committed, so a compile error
/// writes nothing. Commits across partitions are independent: a failure in
/// one partition does not undo partitions committed before it, and the
/// error reports their tempids in `committed`.
pub fn save_delta<C: Connection>(
    registry: &ConnectionRegistry<C>,
    config: &Config,
    delta: &Delta,
) -> Result<SaveResult, SaveError> {
    let attributes = registry.attributes();
    let compiler = DeltaCompiler::new(attributes, config.classification.policy());

    let mut planned = Vec::new();
    for (partition, part) in split_by_partition(attributes, delta)? {
        let conn = registry.connection(&partition)?;
        let compiled = compiler.compile(&part)?;
        planned.push((partition, conn, part, compiled));
    }

    let mut result = SaveResult::default();
    for (partition, conn, part, CompiledTx { ops, scope }) in planned {
        if ops.is_empty() {
            tracing::debug!(
                target: "triple_delta::commit",
                partition = %partition,
                "nothing to commit"
            );
            continue;
        }
        let committed = match commit(conn, &partition, &ops, config) {
            Ok(committed) => committed,
            Err(err) => return Err(err.with_committed(result.tempids)),
        };
        result
            .tempids
            .extend(map_tempids(&part, &scope, &committed, attributes));
    }

    Ok(result)
}

/// Remove the entity `ident` names together with every attribute it has.
pub fn delete_entity<C: Connection>(
    registry: &ConnectionRegistry<C>,
    config: &Config,
    ident: &EntityIdent,
) -> Result<(), SaveError> {
    let attributes = registry.attributes();
    let partition = partition_of(attributes, ident)?;
    let conn = registry.connection(&partition)?;
    let op = DeltaCompiler::new(attributes, config.classification.policy()).compile_delete(ident)?;

    commit(conn, &partition, &[op], config)?;
    Ok(())
}

fn partition_of(attributes: &AttributeRegistry, ident: &EntityIdent) -> Result<String, DeltaError> {
    attributes
        .get(&ident.attribute)
        .filter(|decl| decl.identity)
        .map(|decl| decl.schema.clone())
        .ok_or_else(|| DeltaError::UnknownIdentity {
            attribute: ident.attribute.clone(),
        })
}

fn split_by_partition(
    attributes: &AttributeRegistry,
    delta: &Delta,
) -> Result<BTreeMap<String, Delta>, DeltaError> {
    let mut parts: BTreeMap<String, Delta> = BTreeMap::new();
    for (ident, entity) in delta.iter() {
        let partition = partition_of(attributes, ident)?;
        parts
            .entry(partition)
            .or_default()
            .insert(ident.clone(), entity.clone());
    }
    Ok(parts)
}

/// Transact `ops`, retrying transient failures up to `max_retries` times.
/// No new attempt starts once the transaction timeout has passed.
fn commit<C: Connection>(
    conn: &C,
    partition: &str,
    ops: &[TxOp],
    config: &Config,
) -> Result<TxResult<C::Db>, SaveError> {
    let started = Instant::now();
    let timeout = config.transaction_timeout();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match conn.transact(ops) {
            Ok(result) => {
                tracing::debug!(
                    target: "triple_delta::commit",
                    partition,
                    op_count = ops.len(),
                    attempts,
                    "committed"
                );
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempts <= config.max_retries => {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    tracing::error!(
                        target: "triple_delta::commit",
                        partition,
                        op_count = ops.len(),
                        attempts,
                        ?elapsed,
                        "commit timed out"
                    );
                    return Err(SaveError::CommitTimeout {
                        partition: partition.to_string(),
                        attempts,
                        elapsed,
                        committed: HashMap::new(),
                    });
                }
                tracing::warn!(
                    target: "triple_delta::commit",
                    partition,
                    attempts,
                    %err,
                    "transient commit failure, retrying"
                );
            }
            Err(source) => {
                tracing::error!(
                    target: "triple_delta::commit",
                    partition,
                    op_count = ops.len(),
                    attempts,
                    error = %source,
                    "commit failed"
                );
                return Err(SaveError::Commit {
                    partition: partition.to_string(),
                    op_count: ops.len(),
                    committed: HashMap::new(),
                    source,
                });
            }
        }
    }
}
