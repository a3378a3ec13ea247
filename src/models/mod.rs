//! Data models for claimgraph.
//!
//! This module contains the plain, data-only record types returned by
//! [`crate::graph::GraphIndex`]. None of these types hold a reference back
//! into the store — every field is populated eagerly by the query that
//! produced it, there is no lazy loading and no owning cycle.

pub mod graph;

pub use graph::{
    AliasConflictKind, ClaimOwner, ClaimRecord, DeleteClaimFilter, EntityRecord, MergeOutcome,
    MergeStrategy, RelationshipRecord,
};
