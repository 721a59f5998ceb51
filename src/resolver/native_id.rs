use crate::attribute::AttributeRegistry;
use crate::selection::{Selection, SelectionItem};
use crate::value::{builtin, EntityData};

use super::enums::for_each_entity;

/// Rename the pulled `db/id` back to the native identity key the caller
/// asked for, at every level of `selection`.
pub(crate) fn rewrite_native_ids(
    data: &mut EntityData,
    selection: &Selection,
    attributes: &AttributeRegistry,
) {
    for item in selection.items() {
        match item {
            SelectionItem::Field(key) if attributes.is_native_identity(key) => {
                if let Some(id) = data.remove(&builtin::db_id()) {
                    data.insert(key.clone(), id);
                }
            }
            SelectionItem::Join(key, nested) => {
                if let Some(value) = data.get_mut(key) {
                    for_each_entity(value, &mut |entity: &mut EntityData| {
                        rewrite_native_ids(entity, nested, attributes)
                    });
                }
            }
            SelectionItem::Field(_) => {}
        }
    }
}
