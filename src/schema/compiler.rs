use crate::attribute::{AttributeDeclaration, AttributeRegistry, Cardinality};
use crate::value::Keyword;

use super::type_map::{store_type_for, StoreValueType};
use super::{Schema, SchemaEntry, Unique};

/// One symbolic value of an enum attribute, to be written to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumRecord {
    pub owner: Keyword,
    pub ident: Keyword,
}

/// Derive the store schema for `partition`.
///
/// Native-id attributes never get an entry: the store's own entity id
/// stands in for them.
pub fn compile_schema(partition: &str, registry: &AttributeRegistry) -> Schema {
    let mut schema = Schema::new();
    let mut matched = 0usize;

    for decl in registry.in_partition(partition) {
        matched += 1;
        if decl.native_id {
            continue;
        }
        let entry = schema_entry(decl);
        if entry.is_empty() {
            continue;
        }
        schema.insert(decl.key.clone(), entry);
    }

    if matched == 0 {
        tracing::warn!(
            target: "triple_delta::schema",
            partition,
            "no attributes declared for schema partition"
        );
    }

    schema
}

fn schema_entry(decl: &AttributeDeclaration) -> SchemaEntry {
    let mut entry = SchemaEntry {
        value_type: Some(store_type_for(decl.semantic_type)),
        ..Default::default()
    };
    if decl.cardinality == Cardinality::Many {
        entry.cardinality = Some(Cardinality::Many);
    }
    if decl.identity {
        entry.unique = Some(Unique::Identity);
    }
    if decl.is_ref() {
        entry.value_type = Some(StoreValueType::Ref);
    }
    entry.merge(&decl.schema_override)
}

/// The stable ident for one enumerated value of `owner`.
///
/// Qualified values pass through; bare values are namespaced as
/// `<owner-ns>.<owner-name>/<value>`.
pub fn enum_ident(owner: &Keyword, value: &Keyword) -> Keyword {
    if value.is_qualified() {
        return value.clone();
    }
    let namespace = match owner.namespace() {
        Some(ns) => format!("{}.{}", ns, owner.name()),
        None => owner.name().to_string(),
    };
    Keyword::new(&namespace, value.name())
}

/// Materialization records for every enum attribute in `partition`.
pub fn enum_records(partition: &str, registry: &AttributeRegistry) -> Vec<EnumRecord> {
    registry
        .in_partition(partition)
        .filter(|decl| decl.is_enum())
        .flat_map(|decl| {
            decl.enumerated_values.iter().map(move |value| EnumRecord {
                owner: decl.key.clone(),
                ident: enum_ident(&decl.key, value),
            })
        })
        .collect()
}
