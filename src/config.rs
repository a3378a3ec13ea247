//! Configuration for the graph store.

use std::path::PathBuf;

/// Configuration for opening a [`crate::graph::GraphIndex`].
///
/// Mirrors the teacher's pattern of a small, explicit config struct with a
/// sensible `default_path` helper rather than a global singleton — the
/// index itself stays free of process-wide state (it owns only its db path
/// and connection), per the store's concurrency model.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Path to the `SQLite` database file. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// `PRAGMA busy_timeout` in milliseconds.
    pub busy_timeout_ms: u32,
    /// Whether to enable WAL journaling mode.
    pub wal: bool,
    /// Whether to enforce `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            db_path: Self::default_path(),
            busy_timeout_ms: 5_000,
            wal: true,
            foreign_keys: true,
        }
    }
}

impl GraphConfig {
    /// Creates a config pointing at a specific database file.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Creates a config for an in-memory (non-persistent) database, useful for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            ..Self::default()
        }
    }

    /// Resolves the default on-disk location: `<user data dir>/claimgraph/graph.db`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "claimgraph")
            .map(|dirs| dirs.data_dir().join("graph.db"))
    }

    /// Loads environment-variable overrides (`CLAIMGRAPH_DB_PATH`, `CLAIMGRAPH_BUSY_TIMEOUT_MS`)
    /// on top of the defaults. Missing or malformed variables are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CLAIMGRAPH_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Ok(timeout) = std::env::var("CLAIMGRAPH_BUSY_TIMEOUT_MS") {
            if let Ok(parsed) = timeout.parse() {
                config.busy_timeout_ms = parsed;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_busy_timeout() {
        let config = GraphConfig::default();
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert!(config.wal);
        assert!(config.foreign_keys);
    }

    #[test]
    fn in_memory_has_no_path() {
        assert!(GraphConfig::in_memory().db_path.is_none());
    }
}
