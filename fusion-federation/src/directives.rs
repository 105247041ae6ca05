//! Directive name constants for both schema dialects this crate bridges.
//!
//! The federation names mirror the teacher's own federation spec constants
//! (`apollo-federation::apollo-subgraph::spec`); the stitching names mirror
//! the `@graphql-tools/stitching-directives` package the reference system
//! rewrites into (see DESIGN.md — there is no Rust crate for the stitching
//! side, so these are plain `&str` constants rather than an imported spec).

/// Federation 2 directive names, as they appear on a subgraph's SDL.
pub mod federation {
    pub const KEY: &str = "key";
    pub const EXTENDS: &str = "extends";
    pub const EXTERNAL: &str = "external";
    pub const INACCESSIBLE: &str = "inaccessible";
    pub const OVERRIDE: &str = "override";
    pub const PROVIDES: &str = "provides";
    pub const REQUIRES: &str = "requires";
    pub const SHAREABLE: &str = "shareable";
    pub const TAG: &str = "tag";

    /// The conventional root-level field that identifies a federated
    /// subgraph and, when queried, returns its own SDL.
    pub const SERVICE_FIELD: &str = "_service";
    pub const SERVICE_SDL_QUERY: &str = "{ _service { sdl } }";
}

/// Stitching directive names this crate rewrites federation directives into.
pub mod stitching {
    /// Marks a root field as the entry point for merging a type by key,
    /// the target of a federation `@key` translation.
    pub const MERGE: &str = "merge";
    /// Marks a field as resolved from other fields already present on the
    /// object, the target of a federation `@requires` translation.
    pub const COMPUTED: &str = "computed";
    /// Marks one subgraph's definition of a type as authoritative for
    /// description/directives when multiple subgraphs contribute to it.
    pub const CANONICAL: &str = "canonical";
}
