//! # claimgraph
//!
//! A persistent knowledge-graph store: entities, their aliases, typed
//! relationships between them, and timestamped free-text claims attached
//! either to an entity or to a relationship.
//!
//! The hardest part of this crate is the alias-expansion semantics: a
//! canonical entity plus every entity that also happens to be registered as
//! one of its aliases is treated as a single logical node by every
//! load/delete/claim operation. See [`graph::GraphIndex`] for the full
//! operation surface.
//!
//! ## Example
//!
//! ```rust
//! use claimgraph::graph::GraphIndex;
//! use claimgraph::config::GraphConfig;
//!
//! let index = GraphIndex::open(GraphConfig::in_memory())?;
//! index.upsert_entity("FBI", None)?;
//! index.upsert_alias("FBI", "Federal Bureau of Investigation")?;
//! assert_eq!(index.resolve_alias("Federal Bureau of Investigation")?, "FBI");
//! # Ok::<(), claimgraph::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod models;

pub use config::GraphConfig;
pub use error::{Error, Result};
pub use graph::GraphIndex;
pub use models::graph::{
    AliasConflictKind, ClaimOwner, ClaimRecord, DeleteClaimFilter, EntityRecord, MergeOutcome,
    MergeStrategy, RelationshipRecord,
};
