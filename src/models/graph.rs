//! Knowledge-graph domain records.
//!
//! Entities, relationships, and claims travel through this crate as plain
//! records produced by [`crate::graph::GraphIndex`]. There is no lazy
//! loading: every field below is the result of an eager query, not a
//! back-pointer into the store.

use chrono::{DateTime, Utc};

/// A canonical entity row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Stable surrogate key.
    pub id: i64,
    /// Unique canonical name.
    pub name: String,
    /// Free-form type tag (e.g. "person", "organization"); caller-defined.
    pub entity_type: Option<String>,
    /// When this entity row was first inserted, UTC.
    pub date_added: DateTime<Utc>,
}

/// A relationship (edge) row, joined with the endpoint names for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRecord {
    /// Stable surrogate key.
    pub id: i64,
    /// Source entity id (endpoint as stored; see `directed`/normalization rules).
    pub source_id: i64,
    /// Target entity id.
    pub target_id: i64,
    /// Source entity's canonical name.
    pub source_name: String,
    /// Target entity's canonical name.
    pub target_name: String,
    /// Scalar edge weight.
    pub strength: f64,
    /// Whether the edge is directed (`source -> target`) or undirected.
    pub directed: bool,
    /// When this relationship row was first inserted, UTC.
    pub date_added: DateTime<Utc>,
}

/// A claim row: a dated, sourced, free-text assertion about an entity or a relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    /// Stable surrogate key.
    pub id: i64,
    /// Owning entity id, if this claim is attached to an entity.
    pub entity_id: Option<i64>,
    /// Owning relationship id, if this claim is attached to a relationship.
    pub relationship_id: Option<i64>,
    /// The claim's free text.
    pub content: String,
    /// Optional provenance string (e.g. a document id or URL).
    pub source: Option<String>,
    /// The claim's asserted date (caller-supplied, parsed from ISO-8601).
    pub claim_date: DateTime<Utc>,
    /// When this claim row was inserted, UTC.
    pub date_added: DateTime<Utc>,
}

/// Which side a claim is being attached to in `upsert_claim`.
#[derive(Debug, Clone)]
pub enum ClaimOwner<'a> {
    /// Attach the claim to an entity, identified by name (resolved/created via `upsert_entity`).
    Entity(&'a str),
    /// Attach the claim to a relationship, identified by endpoint names, strength, and directedness.
    Relationship {
        /// Source entity name.
        source: &'a str,
        /// Target entity name.
        target: &'a str,
        /// Edge weight to use if the relationship does not yet exist.
        strength: f64,
        /// Whether the edge is directed.
        directed: bool,
    },
}

/// The distinct ways `upsert_alias`/`delete_alias` can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasConflictKind {
    /// `entity_name == alias` — an entity cannot alias itself.
    SelfAlias,
    /// `entity_name` is itself a registered alias of some other canonical.
    Transitive,
    /// `alias` is already mapped to a different entity.
    AlreadyMappedElsewhere,
    /// The alias is not registered at all (used by `delete_alias`).
    Unmapped,
}

/// Filter mode for `delete_claim`.
#[derive(Debug, Clone)]
pub enum DeleteClaimFilter<'a> {
    /// AND of whichever of the optional fields below are set. The entity
    /// filter (if set) is conservative (canonical only, no alias-expansion);
    /// the relationship filter (if set) is alias-expanded.
    Exact {
        /// Restrict to claims on this (canonical, non-expanded) entity.
        entity_name: Option<&'a str>,
        /// Restrict to claims on relationships between these (alias-expanded) endpoints.
        relationship: Option<(&'a str, &'a str)>,
        /// Directedness to match when `relationship` is set.
        directed: Option<bool>,
        /// Restrict to claims with this exact source string.
        source: Option<&'a str>,
        /// Restrict to claims with `date_added` in `[lo, hi]` (inclusive).
        date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
        /// Restrict to claims with this exact content string.
        content: Option<&'a str>,
    },
    /// Conservative: only the canonical entity's own claim rows.
    ByEntity(&'a str),
    /// Alias-expanded across both endpoint families.
    ByRelationship {
        /// Source entity name (alias-expanded).
        source: &'a str,
        /// Target entity name (alias-expanded).
        target: &'a str,
        /// Directedness to match.
        directed: Option<bool>,
    },
    /// Exact source string match.
    BySource(&'a str),
    /// `date_added` within `[lo, hi]` inclusive.
    ByDate {
        /// Inclusive lower bound.
        lo: DateTime<Utc>,
        /// Inclusive upper bound.
        hi: DateTime<Utc>,
    },
    /// Exact content string match.
    ByContent(&'a str),
}

/// Conflict-handling strategy for `merge_all_aliases`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Re-raise the first conflict encountered (default).
    #[default]
    ErrorOnConflict,
    /// Record the conflict and continue with the remaining aliases.
    SkipOnConflict,
}

/// Result of `merge_all_aliases`.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Aliases that were successfully merged.
    pub merged: Vec<String>,
    /// Aliases that were skipped, with the reason (only populated under `SkipOnConflict`).
    pub skipped: Vec<(String, String)>,
}
