use crate::attribute::AttributeRegistry;
use crate::selection::{Selection, SelectionItem};
use crate::value::{builtin, EntityData, Value};

/// Replace every pulled enum reference with its ident keyword, at any depth
/// of `selection`. References without an ident are left as they are.
pub(crate) fn deref_enums(
    data: &mut EntityData,
    selection: &Selection,
    attributes: &AttributeRegistry,
) {
    for item in selection.items() {
        let key = item.key();
        let Some(value) = data.get_mut(key) else {
            continue;
        };
        match item {
            SelectionItem::Field(_) if attributes.is_enum(key) => deref_value(value),
            SelectionItem::Join(_, nested) => {
                for_each_entity(value, &mut |nested_data: &mut EntityData| {
                    deref_enums(nested_data, nested, attributes)
                })
            }
            SelectionItem::Field(_) => {}
        }
    }
}

fn deref_value(value: &mut Value) {
    match value {
        Value::Many(values) => values.iter_mut().for_each(deref_value),
        Value::Map(entity) => {
            if let Some(ident) = entity.get(&builtin::db_ident()).cloned() {
                *value = ident;
            }
        }
        _ => {}
    }
}

/// Apply `f` to every nested entity map in a to-one or to-many value.
pub(crate) fn for_each_entity(value: &mut Value, f: &mut dyn FnMut(&mut EntityData)) {
    match value {
        Value::Map(entity) => f(entity),
        Value::Many(values) => values.iter_mut().for_each(|v| for_each_entity(v, f)),
        _ => {}
    }
}
