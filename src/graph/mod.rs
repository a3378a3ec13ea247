//! The graph index: a durable entity/alias/relationship/claim store.
//!
//! Grounded on `storage/graph/sqlite.rs`'s `SqliteGraphBackend` in the
//! teacher — a `Mutex<rusqlite::Connection>` guarded store with one
//! connection per process, WAL journaling, and a busy-timeout. Every public
//! mutating method here additionally wraps its body in a single
//! `rusqlite::Transaction` (§5 of the spec requires that guard reads,
//! inserts, and cascading deletes within one call commit or roll back
//! together; the teacher's own graph backend didn't need this because its
//! operations are single-statement upserts).

mod alias;
mod delete;
mod merge;
mod query;
mod schema;
mod upsert;

use crate::config::GraphConfig;
use crate::error::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// The knowledge-graph store.
///
/// # Concurrency model
///
/// A single `Mutex<Connection>` serializes all access from this process.
/// WAL mode and a busy-timeout let other processes/readers proceed
/// concurrently against the same file. There is no process-wide cache —
/// callers that want an in-memory adjacency view build it themselves from
/// [`GraphIndex::dump_all_relationships`] / [`GraphIndex::dump_all_claims`]
/// and accept that it is a point-in-time snapshot.
pub struct GraphIndex {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

/// Acquires the connection mutex, recovering from poisoning.
///
/// A poisoned mutex means a prior operation panicked mid-transaction; since
/// every mutator runs inside an explicit `rusqlite::Transaction` that rolls
/// back on drop, the underlying connection is never left mid-write, so
/// recovering the guard and continuing is safe.
fn acquire_lock(mutex: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("graph index mutex was poisoned, recovering");
            metrics::counter!("claimgraph_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        }
    }
}

impl GraphIndex {
    /// Opens (creating if necessary) the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be initialized.
    #[tracing::instrument(skip(config))]
    pub fn open(config: GraphConfig) -> Result<Self> {
        let conn = match &config.db_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            crate::error::Error::InvalidArgument(format!(
                                "could not create directory {}: {e}",
                                parent.display()
                            ))
                        })?;
                    }
                }
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };

        let index = Self {
            conn: Mutex::new(conn),
            db_path: config.db_path.clone(),
        };
        index.initialize(&config)?;
        Ok(index)
    }

    /// Opens an in-memory store. Convenience for tests and short-lived callers.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        Self::open(GraphConfig::in_memory())
    }

    /// Returns the database path, or `None` for an in-memory store.
    #[must_use]
    pub fn db_path(&self) -> Option<&std::path::Path> {
        self.db_path.as_deref()
    }
}
