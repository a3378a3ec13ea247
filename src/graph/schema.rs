//! Schema initialization and connection pragmas.

use super::{GraphIndex, acquire_lock};
use crate::config::GraphConfig;
use crate::error::Result;

impl GraphIndex {
    /// Sets connection pragmas and creates the schema if it does not already exist.
    pub(super) fn initialize(&self, config: &GraphConfig) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        if config.wal {
            let _ = conn.pragma_update(None, "journal_mode", "WAL");
            let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        }
        conn.pragma_update(None, "busy_timeout", config.busy_timeout_ms)?;
        if config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", "ON")?;
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                entity_type TEXT,
                date_added TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS aliases (
                id INTEGER PRIMARY KEY,
                entity_id INTEGER NOT NULL REFERENCES entities(id),
                alias TEXT UNIQUE NOT NULL,
                date_added TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS relationships (
                id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL REFERENCES entities(id),
                target_id INTEGER NOT NULL REFERENCES entities(id),
                strength REAL NOT NULL DEFAULT 0.0,
                directed INTEGER NOT NULL CHECK (directed IN (0, 1)),
                date_added TEXT NOT NULL,
                UNIQUE(source_id, target_id, directed)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS claims (
                id INTEGER PRIMARY KEY,
                entity_id INTEGER REFERENCES entities(id),
                relationship_id INTEGER REFERENCES relationships(id),
                content TEXT NOT NULL,
                source TEXT,
                claim_date TEXT NOT NULL,
                date_added TEXT NOT NULL,
                CHECK ((entity_id IS NULL) <> (relationship_id IS NULL))
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships(source_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_claims_entity ON claims(entity_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_claims_relationship ON claims(relationship_id)",
            [],
        )?;

        Ok(())
    }
}
