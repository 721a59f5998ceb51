//! Connection registry - one open connection per schema partition, and
//! request-scoped snapshots across all of them.
//!
//! ## Example
//!
//! ```ignore
//! let registry = ConnectionRegistry::start(&InMemoryStore::new(), attributes)?;
//!
//! // Once per incoming request:
//! let env = registry.request_env()?;
//! let rows = resolver.resolve(&env, &ids, &selection)?;
//! ```

mod error;

use std::collections::BTreeMap;

use crate::attribute::AttributeRegistry;
use crate::schema::{compile_schema, ensure_schema, enum_records, materialize_enums};
use crate::store::{Connection, Store};

pub use error::RegistryError;

/// Partition name to open connection, plus the attribute declarations the
/// partitions were built from.
pub struct ConnectionRegistry<C: Connection> {
    attributes: AttributeRegistry,
    connections: BTreeMap<String, C>,
}

impl<C: Connection> ConnectionRegistry<C> {
    /// An empty registry. Connections are added with [`register`].
    ///
    /// [`register`]: ConnectionRegistry::register
    pub fn new(attributes: AttributeRegistry) -> Self {
        Self {
            attributes,
            connections: BTreeMap::new(),
        }
    }

    /// Open every partition the attributes mention: compile its schema,
    /// connect, bring an existing schema up to date and write enum idents.
    pub fn start<S>(store: &S, attributes: AttributeRegistry) -> Result<Self, RegistryError>
    where
        S: Store<Connection = C>,
    {
        let mut registry = Self::new(attributes);
        let partitions: Vec<String> = registry
            .attributes
            .partitions()
            .into_iter()
            .map(str::to_string)
            .collect();

        for partition in partitions {
            let schema = compile_schema(&partition, &registry.attributes);
            let conn = store
                .connect(&partition, &schema)
                .map_err(|source| RegistryError::Open {
                    partition: partition.clone(),
                    source,
                })?;
            ensure_schema(&conn, &partition, &schema)?;
            let enums = materialize_enums(
                &conn,
                &partition,
                &enum_records(&partition, &registry.attributes),
            )?;

            tracing::info!(
                target: "triple_delta::registry",
                partition = %partition,
                attributes = schema.len(),
                enum_values = enums,
                "partition connected"
            );
            registry.register(partition, conn);
        }

        Ok(registry)
    }

    /// Add or replace the connection for `partition`.
    pub fn register(&mut self, partition: impl Into<String>, conn: C) {
        self.connections.insert(partition.into(), conn);
    }

    pub fn connection(&self, partition: &str) -> Result<&C, RegistryError> {
        self.connections
            .get(partition)
            .ok_or_else(|| RegistryError::MissingConnection {
                partition: partition.to_string(),
                available: self.connections.keys().cloned().collect(),
            })
    }

    pub fn partitions(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    /// Snapshot every partition once. Every resolver run with the returned
    /// env sees the same point-in-time state.
    pub fn request_env(&self) -> Result<RequestEnv<C::Db>, RegistryError> {
        let mut snapshots = BTreeMap::new();
        for (partition, conn) in &self.connections {
            let db = conn.db().map_err(|source| RegistryError::Snapshot {
                partition: partition.clone(),
                source,
            })?;
            snapshots.insert(partition.clone(), db);
        }
        Ok(RequestEnv { snapshots })
    }

    pub fn close(&self) -> Result<(), RegistryError> {
        for (partition, conn) in &self.connections {
            conn.close().map_err(|source| RegistryError::Close {
                partition: partition.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Immutable snapshots of every partition, taken once per request.
#[derive(Clone, Debug)]
pub struct RequestEnv<D> {
    snapshots: BTreeMap<String, D>,
}

impl<D> RequestEnv<D> {
    pub fn from_snapshots(snapshots: BTreeMap<String, D>) -> Self {
        Self { snapshots }
    }

    pub fn db(&self, partition: &str) -> Result<&D, RegistryError> {
        self.snapshots
            .get(partition)
            .ok_or_else(|| RegistryError::MissingConnection {
                partition: partition.to_string(),
                available: self.snapshots.keys().cloned().collect(),
            })
    }

    pub fn partitions(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }
}
