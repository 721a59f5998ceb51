use std::collections::BTreeMap;

use crate::delta::{EntityRef, TxOp, TxValue};
use crate::store::{Connection, Database, StoreError};
use crate::tempid::allocate;
use crate::value::{builtin, Value};

use super::{EnumRecord, Schema, SchemaError};

/// Whether a schema-update failure only means "nothing to do".
///
/// Typed `AlreadyExists` errors are matched directly. Backends that only
/// report free text are matched on the message, case-insensitively.
pub fn is_benign_schema_error(err: &StoreError) -> bool {
    match err {
        StoreError::AlreadyExists(_) => true,
        StoreError::Other(message) => {
            let message = message.to_lowercase();
            message.contains("already exists") || message.contains("identical")
        }
        _ => false,
    }
}

fn is_duplicate_write(err: &StoreError) -> bool {
    is_benign_schema_error(err) || matches!(err, StoreError::UniqueConflict { .. })
}

/// Bring the schema of an existing database up to date with `schema`.
pub fn ensure_schema<C: Connection>(
    conn: &C,
    partition: &str,
    schema: &Schema,
) -> Result<(), SchemaError> {
    if schema.is_empty() {
        return Ok(());
    }

    match conn.update_schema(schema) {
        Ok(()) => {
            tracing::debug!(
                target: "triple_delta::schema",
                partition,
                attributes = schema.len(),
                "schema updated"
            );
            Ok(())
        }
        Err(err) if is_benign_schema_error(&err) => {
            tracing::debug!(
                target: "triple_delta::schema",
                partition,
                %err,
                "schema already current"
            );
            Ok(())
        }
        Err(err) => Err(SchemaError::Incompatible {
            partition: partition.to_string(),
            attempted: schema.keys().cloned().collect(),
            message: err.to_string(),
        }),
    }
}

/// Write one ident entity per enum record that does not exist yet.
/// Returns how many idents were newly created, so a reopen reports zero.
pub fn materialize_enums<C: Connection>(
    conn: &C,
    partition: &str,
    records: &[EnumRecord],
) -> Result<usize, SchemaError> {
    let failed = |source: StoreError| SchemaError::Materialization {
        partition: partition.to_string(),
        source,
    };
    let idents: Vec<Value> = records
        .iter()
        .map(|record| Value::Keyword(record.ident.clone()))
        .collect();
    let existing = conn
        .db()
        .and_then(|db| db.lookup_many(&builtin::db_ident(), &idents))
        .map_err(failed)?;

    let mut written = 0;
    for (record, eid) in records.iter().zip(existing) {
        if let Some(eid) = eid {
            tracing::debug!(
                target: "triple_delta::schema",
                partition,
                ident = %record.ident,
                eid,
                "enum value already materialized"
            );
            continue;
        }

        let mut writes = BTreeMap::new();
        writes.insert(
            builtin::db_ident(),
            TxValue::Scalar(Value::Keyword(record.ident.clone())),
        );
        let op = TxOp::Upsert {
            entity: EntityRef::Temp(allocate()),
            writes,
        };

        match conn.transact(&[op]) {
            Ok(_) => written += 1,
            // Another process wrote it since the lookup.
            Err(err) if is_duplicate_write(&err) => {
                tracing::debug!(
                    target: "triple_delta::schema",
                    partition,
                    ident = %record.ident,
                    %err,
                    "enum value already materialized"
                );
            }
            Err(source) => return Err(failed(source)),
        }
    }

    Ok(written)
}
