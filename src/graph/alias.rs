//! Alias resolution and id-expansion helpers shared by every other module.
//!
//! Ported from `_normalize_pair`/`_expand_ids`/`_relationship_ids_alias_expanded`
//! in the original Python `GraphIndex`. Every load/delete/claim path routes
//! through these three functions rather than re-deriving the logic inline.

use super::{GraphIndex, acquire_lock};
use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params_from_iter};

impl GraphIndex {
    /// Returns the canonical name for `name`: if `name` is a registered
    /// alias, the name of the entity it maps to; if `name` is itself an
    /// entity, `name` unchanged; otherwise `name` unchanged (not yet an
    /// entity or alias of one).
    #[tracing::instrument(skip(self))]
    pub fn resolve_alias(&self, name: &str) -> Result<String> {
        let conn = acquire_lock(&self.conn);
        resolve_alias_locked(&conn, name)
    }

    /// Returns `true` if an entity with this exact name exists (no alias resolution).
    #[tracing::instrument(skip(self))]
    pub fn entity_exists(&self, name: &str) -> Result<bool> {
        let conn = acquire_lock(&self.conn);
        entity_id_by_name(&conn, name).map(|id| id.is_some())
    }
}

/// Connection-level version of [`GraphIndex::resolve_alias`], used internally
/// so callers already holding the lock don't re-acquire it.
pub(super) fn resolve_alias_locked(conn: &Connection, name: &str) -> Result<String> {
    if let Some(entity_id) = conn
        .query_row(
            "SELECT entity_id FROM aliases WHERE alias = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
    {
        let canonical: String = conn.query_row(
            "SELECT name FROM entities WHERE id = ?1",
            [entity_id],
            |row| row.get(0),
        )?;
        return Ok(canonical);
    }

    let entity_name: Option<String> = conn
        .query_row(
            "SELECT name FROM entities WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(entity_name.unwrap_or_else(|| name.to_string()))
}

pub(super) fn entity_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM entities WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?)
}

pub(super) fn require_entity_id(conn: &Connection, canonical: &str) -> Result<i64> {
    entity_id_by_name(conn, canonical)?.ok_or_else(|| Error::EntityNotFound {
        name: canonical.to_string(),
        hint: None,
    })
}

/// Normalizes endpoint ordering for undirected edges: `directed == false`
/// stores the pair with the smaller id first, so there is exactly one row
/// per unordered pair.
pub(super) fn normalize_pair(source_id: i64, target_id: i64, directed: bool) -> (i64, i64, bool) {
    if !directed && source_id > target_id {
        (target_id, source_id, false)
    } else {
        (source_id, target_id, directed)
    }
}

/// Returns `[canonical_id]` plus the ids of any alias-entities registered
/// against `name`'s canonical entity (an alias string that also happens to
/// be its own row in `entities`).
pub(super) fn expand_ids(conn: &Connection, name: &str) -> Result<Vec<i64>> {
    let canonical = resolve_alias_locked(conn, name)?;
    let canonical_id = require_entity_id(conn, &canonical)?;

    let mut ids = vec![canonical_id];

    let mut stmt = conn.prepare("SELECT alias FROM aliases WHERE entity_id = ?1")?;
    let alias_names: Vec<String> = stmt
        .query_map([canonical_id], |row| row.get(0))?
        .collect::<std::result::Result<_, _>>()?;

    for alias in alias_names {
        if let Some(id) = entity_id_by_name(conn, &alias)? {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Returns relationship ids between the alias-expanded families of
/// `src_name` and `tgt_name`.
///
/// - `directed == true`: only rows with `directed = 1` and
///   `source_id IN src_ids AND target_id IN tgt_ids` (order matters).
/// - `directed == false`: only rows with `directed = 0`, matching either
///   orientation of the unordered pair.
///
/// Returns an empty list (rather than erroring) if either name does not
/// resolve to an existing entity — callers treat "no relationship" and
/// "no entity" identically here, matching the original's no-op semantics.
pub(super) fn relationship_ids_alias_expanded(
    conn: &Connection,
    src_name: &str,
    tgt_name: &str,
    directed: bool,
) -> Result<Vec<i64>> {
    let src_canonical = resolve_alias_locked(conn, src_name)?;
    let tgt_canonical = resolve_alias_locked(conn, tgt_name)?;

    let src_ids = match expand_ids(conn, &src_canonical) {
        Ok(ids) => ids,
        Err(Error::EntityNotFound { .. }) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let tgt_ids = match expand_ids(conn, &tgt_canonical) {
        Ok(ids) => ids,
        Err(Error::EntityNotFound { .. }) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let ps_src = placeholders(src_ids.len());
    let ps_tgt = placeholders(tgt_ids.len());

    let (sql, params) = if directed {
        (
            format!(
                "SELECT id FROM relationships WHERE directed = 1 \
                 AND source_id IN ({ps_src}) AND target_id IN ({ps_tgt})"
            ),
            [src_ids.clone(), tgt_ids.clone()].concat(),
        )
    } else {
        (
            format!(
                "SELECT id FROM relationships WHERE directed = 0 AND (
                    (source_id IN ({ps_src}) AND target_id IN ({ps_tgt}))
                    OR
                    (source_id IN ({ps_tgt}) AND target_id IN ({ps_src}))
                )"
            ),
            [src_ids.clone(), tgt_ids.clone(), tgt_ids, src_ids].concat(),
        )
    };

    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(ids)
}

/// Returns `true` if any relationship exists between the alias-expanded
/// families of `entity1_name` and `entity2_name`, in either orientation.
pub(super) fn has_relationship_between(
    conn: &Connection,
    entity1_name: &str,
    entity2_name: &str,
) -> Result<bool> {
    let c1 = resolve_alias_locked(conn, entity1_name)?;
    let ids1 = match expand_ids(conn, &c1) {
        Ok(ids) => ids,
        Err(Error::EntityNotFound { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };

    let c2 = resolve_alias_locked(conn, entity2_name)?;
    let ids2 = match expand_ids(conn, &c2) {
        Ok(ids) => ids,
        Err(Error::EntityNotFound { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };

    let ps1 = placeholders(ids1.len());
    let ps2 = placeholders(ids2.len());
    let sql = format!(
        "SELECT 1 FROM relationships
         WHERE (source_id IN ({ps1}) AND target_id IN ({ps2}))
            OR (source_id IN ({ps2}) AND target_id IN ({ps1}))
         LIMIT 1"
    );
    let params = [ids1.clone(), ids2.clone(), ids2, ids1].concat();

    Ok(conn
        .query_row(&sql, params_from_iter(params), |_| Ok(()))
        .optional()?
        .is_some())
}

pub(super) fn placeholders(n: usize) -> String {
    std::iter::repeat_n("?", n.max(1)).collect::<Vec<_>>().join(",")
}
