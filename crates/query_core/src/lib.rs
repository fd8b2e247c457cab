//! Tree algorithms for the editable query tree: id minting, lookup,
//! default-value resolution, id-addressed mutation, pruning and the flat
//! projection. Nothing in here owns session state; every operation takes a
//! snapshot and returns a new one.

pub mod canonical;
pub mod id;
pub mod locator;
pub mod mutation;
pub mod normalize;
pub mod projection;
pub mod resolver;

pub use canonical::Canonicalizer;
pub use id::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use locator::{collect_ids, contains_id, find_node, find_path, level_of};
pub use mutation::{MutationEngine, ResetPolicy};
pub use normalize::normalize;
pub use projection::{is_empty_view, project_flat};
pub use resolver::{
    default_combinators, default_operators, FieldCatalog, FieldPolicy, NoPolicy, Resolver,
};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
