//! Rewrites federated subgraphs into stitchable form and merges every
//! subgraph — federated or not — into one [`UnifiedSchema`].
//!
//! [`merge_subgraphs`] is the entry point a host calls once per supergraph
//! generation (including hot reloads). Everything else in this crate is a
//! piece that operation wires together: federation detection ([`detect`]),
//! the conventional SDL fetch ([`sdl_fetch`]), the directive rewrite itself
//! ([`translate`]), local resolver carry-over ([`resolvers`]), and the
//! canonical-form comparison used to decide whether a reload actually
//! changed anything ([`schema_compare`]).

pub mod detect;
pub mod directives;
pub mod error;
pub mod link;
pub mod merge;
pub mod resolvers;
pub mod schema_compare;
pub mod sdl_fetch;
pub mod translate;

pub use error::AggregateMergeError;
pub use error::MergeError;
pub use merge::Subschema;
pub use merge::StitchConfig;
pub use merge::SubgraphInput;
pub use merge::UnifiedSchema;
pub use merge::merge_subgraphs;
pub use resolvers::OpaqueResolver;
pub use resolvers::ResolverKey;
pub use resolvers::ResolverMap;
pub use schema_compare::compare_documents;
pub use schema_compare::compare_schemas;
pub use translate::TranslationCache;
