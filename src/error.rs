//! Error type for claimgraph operations.
//!
//! Uses `thiserror` for automatic `Display`/`Error` impls, mirroring the
//! closed-taxonomy approach the store's design calls for: one variant per
//! semantic failure kind, each carrying the names/counts referenced in its
//! message. `Sqlite` is the one ambient addition — a connectivity/IO
//! failure isn't one of the store's semantic conflict kinds.

use crate::models::graph::AliasConflictKind;
use thiserror::Error as ThisError;

/// Error type for claimgraph operations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A required canonical entity does not exist.
    #[error("entity not found: {name}{}", hint.as_ref().map(|h| format!(" ({h})")).unwrap_or_default())]
    EntityNotFound {
        /// The name that was looked up.
        name: String,
        /// An optional hint (e.g. pointing at the real canonical name).
        hint: Option<String>,
    },

    /// Self-alias, transitive alias, or an alias already bound elsewhere.
    #[error("alias conflict ({kind:?}): {detail}")]
    AliasConflict {
        /// Which conflict class was hit.
        kind: AliasConflictKind,
        /// The alias string involved.
        alias: String,
        /// The entity name involved.
        entity: String,
        /// A human-readable explanation.
        detail: String,
    },

    /// An operation would produce or match a self-relationship.
    #[error("relationship collision: '{source}' and '{target}' resolve to the same entity")]
    RelationshipCollision {
        /// The source name as given by the caller.
        source: String,
        /// The target name as given by the caller.
        target: String,
    },

    /// A load-by-endpoints lookup found no matching row under the requested directedness.
    #[error("relationship not found: '{source}' -> '{target}' (directed={directed:?})")]
    RelationshipNotFound {
        /// The source name as given by the caller.
        source: String,
        /// The target name as given by the caller.
        target: String,
        /// The directedness that was requested.
        directed: Option<bool>,
    },

    /// A merge would collapse an edge to a self-loop.
    #[error("merging '{alias}' into '{canonical}' would collapse a relationship into a self-loop")]
    RelationshipMergeConflict {
        /// The canonical entity name.
        canonical: String,
        /// The alias entity name being merged.
        alias: String,
    },

    /// Refuse to delete because of dangling references, or because the
    /// caller passed an alias where a canonical name was required.
    #[error("cannot delete {subject} from {relation}: {detail}")]
    DeletionConflict {
        /// The name/identifier the caller tried to delete.
        subject: String,
        /// Which relation the deletion targeted ("entities", "relationships", "aliases").
        relation: &'static str,
        /// A human-readable explanation.
        detail: String,
    },

    /// Malformed arguments: claim bound to both or neither owner, unknown
    /// delete mode, empty filter set, unknown merge strategy, etc.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing `SQLite` connection reported a failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type alias for claimgraph operations.
pub type Result<T> = std::result::Result<T, Error>;
