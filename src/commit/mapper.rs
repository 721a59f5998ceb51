use std::collections::HashMap;

use crate::attribute::AttributeRegistry;
use crate::delta::Delta;
use crate::selection::Selection;
use crate::store::{Database, TxResult};
use crate::tempid::TempIdScope;
use crate::value::{TempId, Value};

/// Map every temporary identifier in `delta` to the permanent identity
/// value of the entity it created.
///
/// Identifiers whose entity the commit never touched, or whose identity
/// cannot be read back, are left out.
pub fn map_tempids<D: Database>(
    delta: &Delta,
    scope: &TempIdScope,
    result: &TxResult<D>,
    attributes: &AttributeRegistry,
) -> HashMap<TempId, Value> {
    let mut mapped = HashMap::new();

    for (ident, temp) in delta.temp_ids() {
        let Some(eid) = scope
            .get(&temp)
            .and_then(|allocated| result.tempids.get(&allocated))
            .copied()
        else {
            continue;
        };

        if attributes.is_native_identity(&ident.attribute) {
            mapped.insert(temp, Value::Long(eid));
            continue;
        }

        let selection = Selection::new().field(ident.attribute.clone());
        match result.db_after.pull(eid, &selection) {
            Ok(Some(mut data)) => {
                if let Some(value) = data.remove(&ident.attribute) {
                    mapped.insert(temp, value);
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(
                    target: "triple_delta::commit",
                    %temp,
                    eid,
                    %err,
                    "could not read back identity"
                );
            }
        }
    }

    mapped
}
