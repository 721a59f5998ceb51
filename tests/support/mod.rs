#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use triple_delta::{
    AttributeDeclaration, AttributeRegistry, Connection, ConnectionRegistry, InMemoryConnection,
    InMemoryStore, SemanticType, Store, StoreError, TxOp, TxResult,
};

/// Accounts with addresses, native-id items and a fixture type in a second
/// partition.
pub fn attributes() -> AttributeRegistry {
    AttributeRegistry::new(vec![
        AttributeDeclaration::new("account/id", SemanticType::Uuid)
            .identity()
            .partition("production"),
        AttributeDeclaration::new("account/name", SemanticType::String)
            .owned_by("account/id")
            .partition("production"),
        AttributeDeclaration::new("account/role", SemanticType::Enum)
            .owned_by("account/id")
            .enum_values(["admin", "user"])
            .partition("production"),
        AttributeDeclaration::new("account/flags", SemanticType::Enum)
            .many()
            .owned_by("account/id")
            .enum_values(["beta", "staff"])
            .partition("production"),
        AttributeDeclaration::new("account/tags", SemanticType::String)
            .many()
            .owned_by("account/id")
            .partition("production"),
        AttributeDeclaration::new("account/addresses", SemanticType::Ref)
            .many()
            .owned_by("account/id")
            .partition("production"),
        AttributeDeclaration::new("address/id", SemanticType::Uuid)
            .identity()
            .partition("production"),
        AttributeDeclaration::new("address/street", SemanticType::String)
            .owned_by("address/id")
            .partition("production"),
        AttributeDeclaration::new("item/id", SemanticType::Long)
            .identity()
            .native_id()
            .partition("production"),
        AttributeDeclaration::new("item/label", SemanticType::String)
            .owned_by("item/id")
            .partition("production"),
        AttributeDeclaration::new("item/kind", SemanticType::Enum)
            .owned_by("item/id")
            .enum_values(["tool", "part"])
            .partition("production"),
        AttributeDeclaration::new("item/parts", SemanticType::Ref)
            .many()
            .owned_by("item/id")
            .partition("production"),
        AttributeDeclaration::new("fixture/id", SemanticType::String)
            .identity()
            .partition("test"),
        AttributeDeclaration::new("fixture/note", SemanticType::String)
            .owned_by("fixture/id")
            .partition("test"),
        AttributeDeclaration::new("audit/id", SemanticType::String)
            .identity()
            .without_resolver()
            .partition("test"),
    ])
    .expect("fixture attributes are valid")
}

pub fn registry() -> ConnectionRegistry<InMemoryConnection> {
    ConnectionRegistry::start(&InMemoryStore::new(), attributes()).expect("registry starts")
}

/// Wraps a connection and fails its first `failures` commits with a
/// transient error.
pub struct FlakyConnection<C> {
    inner: C,
    failures: AtomicU32,
    attempts: AtomicU32,
}

impl<C: Connection> FlakyConnection<C> {
    pub fn new(inner: C, failures: u32) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<C: Connection> Connection for FlakyConnection<C> {
    type Db = C::Db;

    fn partition(&self) -> &str {
        self.inner.partition()
    }

    fn db(&self) -> Result<C::Db, StoreError> {
        self.inner.db()
    }

    fn transact(&self, ops: &[TxOp]) -> Result<TxResult<C::Db>, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Transient("write conflict".into()));
        }
        self.inner.transact(ops)
    }

    fn update_schema(&self, schema: &triple_delta::Schema) -> Result<(), StoreError> {
        self.inner.update_schema(schema)
    }

    fn close(&self) -> Result<(), StoreError> {
        self.inner.close()
    }
}

/// A registry whose production partition fails its first `failures` commits.
pub fn flaky_registry(failures: u32) -> ConnectionRegistry<FlakyConnection<InMemoryConnection>> {
    let store = InMemoryStore::new();
    let started = ConnectionRegistry::start(&store, attributes()).expect("registry starts");

    let mut registry = ConnectionRegistry::new(attributes());
    for partition in started.partitions() {
        let conn = store
            .connect(partition, &Default::default())
            .expect("reconnect");
        let failures = if partition == "production" { failures } else { 0 };
        registry.register(partition, FlakyConnection::new(conn, failures));
    }
    registry
}
