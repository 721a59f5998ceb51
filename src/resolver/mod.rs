//! Resolvers - batched reads by identity for the host query engine.
//!
//! Every identity attribute gets an [`IdentityResolver`] (batch of ids in,
//! aligned records out) and an [`AllIdsResolver`] (every id of the type).
//! Both read from the snapshots in a [`RequestEnv`], so all resolvers run
//! for one request see the same state.
//!
//! [`RequestEnv`]: crate::registry::RequestEnv

mod all_ids;
mod enums;
mod error;
mod identity;
mod native_id;

use serde::Serialize;

use crate::attribute::AttributeRegistry;
use crate::config::Config;
use crate::registry::RequestEnv;
use crate::selection::Selection;
use crate::store::Database;
use crate::value::{EntityData, Keyword, Value};

pub use all_ids::AllIdsResolver;
pub use error::ResolverError;
pub use identity::IdentityResolver;

/// How the host query engine sees a resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolverSignature {
    pub name: String,
    pub inputs: Vec<Keyword>,
    pub outputs: Vec<Keyword>,
    /// Accepts many inputs per call.
    pub batch: bool,
}

pub trait Resolver<D: Database>: Send + Sync {
    fn signature(&self) -> &ResolverSignature;

    /// One output record per input, in input order.
    fn resolve(
        &self,
        env: &RequestEnv<D>,
        inputs: &[Value],
        selection: &Selection,
    ) -> Result<Vec<EntityData>, ResolverError>;
}

/// Build the resolvers for every identity attribute that wants them.
pub fn generate_resolvers<D: Database>(
    attributes: &AttributeRegistry,
    config: &Config,
) -> Vec<Box<dyn Resolver<D>>> {
    let mut resolvers: Vec<Box<dyn Resolver<D>>> = Vec::new();

    for identity in attributes.identities().filter(|decl| decl.generate_resolver) {
        resolvers.push(Box::new(IdentityResolver::new(identity, attributes, config)));
        resolvers.push(Box::new(AllIdsResolver::new(identity, attributes)));
    }

    tracing::debug!(
        target: "triple_delta::resolver",
        count = resolvers.len(),
        "generated resolvers"
    );
    resolvers
}
