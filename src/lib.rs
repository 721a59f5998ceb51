mod attribute;
mod commit;
mod config;
mod delta;
mod registry;
mod resolver;
mod schema;
mod selection;
mod store;
mod tempid;
mod value;

pub use attribute::{
    AttributeDeclaration, AttributeError, AttributeRegistry, Cardinality, SemanticType,
};
pub use commit::{delete_entity, map_tempids, save_delta, SaveError, SaveResult};
pub use config::Config;
pub use delta::{
    Change, Classification, CompiledTx, Delta, DeltaCompiler, DeltaError, EntityDelta, EntityRef,
    IdentityGenerator, NewEntityPolicy, RandomIdentities, ShapeHeuristic, TempIdsOnly, TxOp,
    TxValue,
};
pub use registry::{ConnectionRegistry, RegistryError, RequestEnv};
pub use resolver::{
    generate_resolvers, AllIdsResolver, IdentityResolver, Resolver, ResolverError,
    ResolverSignature,
};
pub use schema::{
    compile_schema, ensure_schema, enum_ident, enum_records, is_benign_schema_error,
    materialize_enums, store_type_for, EnumRecord, Schema, SchemaEntry, SchemaError,
    StoreValueType, Unique,
};
pub use selection::{Selection, SelectionItem};
pub use store::{
    Connection, Database, EntityId, InMemoryConnection, InMemoryDatabase, InMemoryStore, Store,
    StoreError, TxResult,
};
pub use tempid::{allocate, AllocatedId, TempIdScope};
pub use value::{builtin, EntityData, EntityIdent, Keyword, TempId, Value};
