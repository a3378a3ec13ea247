//! Read-only queries: aliases, claims, relationships, full dumps.
//!
//! Ported from `load_aliases`/`load_entity_claims`/`load_relationships`/
//! `load_relationship_claims`/`list_all_entities`/`list_all_aliases`/
//! `dump_all_relationships`/`dump_all_claims` in the original Python
//! `GraphIndex`.

use super::alias::{expand_ids, relationship_ids_alias_expanded, require_entity_id, resolve_alias_locked};
use super::{GraphIndex, acquire_lock};
use crate::error::Result;
use crate::models::graph::{ClaimRecord, EntityRecord, RelationshipRecord};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params_from_iter};
use std::collections::HashMap;

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl GraphIndex {
    /// Returns the aliases registered against `name`'s canonical entity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EntityNotFound`] if the canonical entity does
    /// not exist.
    #[tracing::instrument(skip(self))]
    pub fn load_aliases(&self, name: &str) -> Result<Vec<String>> {
        let conn = acquire_lock(&self.conn);
        let canonical = resolve_alias_locked(&conn, name)?;
        let entity_id = require_entity_id(&conn, &canonical)?;

        let mut stmt =
            conn.prepare("SELECT alias FROM aliases WHERE entity_id = ?1 ORDER BY alias")?;
        let aliases = stmt
            .query_map([entity_id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(aliases)
    }

    /// Returns the claims attached to `name`'s canonical entity and to any
    /// alias-entities registered against it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EntityNotFound`] if the canonical entity does
    /// not exist.
    #[tracing::instrument(skip(self))]
    pub fn load_entity_claims(&self, name: &str) -> Result<Vec<ClaimRecord>> {
        let conn = acquire_lock(&self.conn);
        let canonical = resolve_alias_locked(&conn, name)?;
        require_entity_id(&conn, &canonical)?;

        let entity_ids = expand_ids(&conn, &canonical)?;
        let placeholders = super::alias::placeholders(entity_ids.len());
        let sql = format!(
            "SELECT id, entity_id, relationship_id, content, source, claim_date, date_added
             FROM claims WHERE entity_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(entity_ids), row_to_claim)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns the relationships touching `name`'s canonical entity and any
    /// of its alias-entities, deduplicated to one row per logical edge.
    ///
    /// When both an alias-entity edge and a canonical edge exist for the
    /// same unordered pair, the row where the canonical entity itself
    /// participates wins; directed rows are preferred over undirected ones;
    /// ties break on insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EntityNotFound`] if the canonical entity does
    /// not exist.
    #[tracing::instrument(skip(self))]
    pub fn load_relationships(
        &self,
        name: &str,
        min_strength: Option<f64>,
        directed: Option<bool>,
    ) -> Result<Vec<RelationshipRecord>> {
        let conn = acquire_lock(&self.conn);
        let canonical = resolve_alias_locked(&conn, name)?;
        let canonical_id = require_entity_id(&conn, &canonical)?;

        let entity_ids = expand_ids(&conn, &canonical)?;
        let ps = super::alias::placeholders(entity_ids.len());

        let mut where_clauses = vec![format!("(r.source_id IN ({ps}) OR r.target_id IN ({ps}))")];
        let mut params: Vec<rusqlite::types::Value> = entity_ids
            .iter()
            .chain(entity_ids.iter())
            .map(|id| rusqlite::types::Value::Integer(*id))
            .collect();

        if let Some(min_strength) = min_strength {
            where_clauses.push("r.strength >= ?".to_string());
            params.push(rusqlite::types::Value::Real(min_strength));
        }
        if let Some(directed) = directed {
            where_clauses.push("r.directed = ?".to_string());
            params.push(rusqlite::types::Value::Integer(i64::from(directed)));
        }

        params.push(rusqlite::types::Value::Integer(canonical_id));
        params.push(rusqlite::types::Value::Integer(canonical_id));

        let sql = format!(
            "SELECT r.id, e1.name AS source, e2.name AS target, r.strength, r.source_id, \
             r.target_id, r.directed, r.date_added
             FROM relationships r
             JOIN entities e1 ON r.source_id = e1.id
             JOIN entities e2 ON r.target_id = e2.id
             WHERE {}
             ORDER BY CASE WHEN r.source_id = ? OR r.target_id = ? THEN 0 ELSE 1 END, \
             r.directed DESC, r.id",
            where_clauses.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut seen: HashMap<(i64, i64, i64), RelationshipRecord> = HashMap::new();
        let mut order: Vec<(i64, i64, i64)> = Vec::new();
        for row in rows {
            let (rel_id, source, target, strength, source_id, target_id, directed_int, date_added) =
                row?;
            let key = if directed_int == 0 {
                (source_id.min(target_id), source_id.max(target_id), 0)
            } else {
                (source_id, target_id, 1)
            };
            if !seen.contains_key(&key) {
                order.push(key);
                seen.insert(
                    key,
                    RelationshipRecord {
                        id: rel_id,
                        source_id,
                        target_id,
                        source_name: source,
                        target_name: target,
                        strength,
                        directed: directed_int != 0,
                        date_added: parse_timestamp(&date_added),
                    },
                );
            }
        }

        Ok(order.into_iter().filter_map(|k| seen.remove(&k)).collect())
    }

    /// Returns claims attached to the relationship(s) between the
    /// alias-expanded families of `source` and `target`.
    ///
    /// `directed = None` returns claims for both the undirected edge and
    /// either directed orientation between the two families.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RelationshipCollision`] if `source` and
    /// `target` resolve to the same canonical entity.
    #[tracing::instrument(skip(self))]
    pub fn load_relationship_claims(
        &self,
        source: &str,
        target: &str,
        directed: Option<bool>,
    ) -> Result<Vec<ClaimRecord>> {
        let conn = acquire_lock(&self.conn);
        let source_canonical = resolve_alias_locked(&conn, source)?;
        let target_canonical = resolve_alias_locked(&conn, target)?;
        if source_canonical == target_canonical {
            return Err(crate::error::Error::RelationshipCollision {
                source: source.to_string(),
                target: target.to_string(),
            });
        }

        let rel_ids = relationship_ids_for_claims(&conn, &source_canonical, &target_canonical, directed)?;
        if rel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = super::alias::placeholders(rel_ids.len());
        let sql = format!(
            "SELECT id, entity_id, relationship_id, content, source, claim_date, date_added
             FROM claims WHERE relationship_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(rel_ids), row_to_claim)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns all canonical entity names, sorted. Does not include aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn list_all_entities(&self) -> Result<Vec<String>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare("SELECT name FROM entities ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns all aliases for `entity_name`'s canonical entity, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EntityNotFound`] if the canonical entity does
    /// not exist.
    #[tracing::instrument(skip(self))]
    pub fn list_all_aliases(&self, entity_name: &str) -> Result<Vec<String>> {
        let conn = acquire_lock(&self.conn);
        let canonical = resolve_alias_locked(&conn, entity_name)?;
        let canonical_id = require_entity_id(&conn, &canonical)?;

        let mut stmt =
            conn.prepare("SELECT alias FROM aliases WHERE entity_id = ?1 ORDER BY alias")?;
        let rows = stmt
            .query_map([canonical_id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns every relationship in the store with endpoint names resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn dump_all_relationships(&self) -> Result<Vec<RelationshipRecord>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT r.id, e1.name, e2.name, r.strength, r.source_id, r.target_id, r.directed, \
             r.date_added
             FROM relationships r
             JOIN entities e1 ON e1.id = r.source_id
             JOIN entities e2 ON e2.id = r.target_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RelationshipRecord {
                    id: row.get(0)?,
                    source_name: row.get(1)?,
                    target_name: row.get(2)?,
                    strength: row.get(3)?,
                    source_id: row.get(4)?,
                    target_id: row.get(5)?,
                    directed: row.get::<_, i64>(6)? != 0,
                    date_added: parse_timestamp(&row.get::<_, String>(7)?),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns every claim in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn dump_all_claims(&self) -> Result<Vec<ClaimRecord>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT id, entity_id, relationship_id, content, source, claim_date, date_added
             FROM claims",
        )?;
        let rows = stmt
            .query_map([], row_to_claim)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    /// Returns an entity's full record (id, name, type, date added) by its
    /// exact canonical name, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn get_entity(&self, name: &str) -> Result<Option<EntityRecord>> {
        let conn = acquire_lock(&self.conn);
        let canonical = resolve_alias_locked(&conn, name)?;
        get_entity_locked(&conn, &canonical)
    }

    /// Looks up the single relationship between `source` and `target` under
    /// the requested directedness.
    ///
    /// This is the eager, data-only replacement for the original's lazy
    /// `Relationship` constructor (`graph.py`) — no back-pointer into the
    /// store, no hidden IO on field access, just one query returning a
    /// [`RelationshipRecord`] or an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RelationshipCollision`] if `source` and
    /// `target` resolve to the same canonical entity, or
    /// [`crate::Error::RelationshipNotFound`] if no relationship between the
    /// alias-expanded families of `source` and `target` matches `directed`.
    #[tracing::instrument(skip(self))]
    pub fn get_relationship(
        &self,
        source: &str,
        target: &str,
        directed: bool,
    ) -> Result<RelationshipRecord> {
        let (source_canonical, target_canonical) = {
            let conn = acquire_lock(&self.conn);
            let source_canonical = resolve_alias_locked(&conn, source)?;
            let target_canonical = resolve_alias_locked(&conn, target)?;
            if source_canonical == target_canonical {
                return Err(crate::error::Error::RelationshipCollision {
                    source: source.to_string(),
                    target: target.to_string(),
                });
            }
            (source_canonical, target_canonical)
        };

        let found = if directed {
            self.load_relationships(&source_canonical, None, Some(true))?
                .into_iter()
                .find(|r| r.source_name == source_canonical && r.target_name == target_canonical)
        } else {
            self.load_relationships(&source_canonical, None, Some(false))?
                .into_iter()
                .find(|r| {
                    (r.source_name == source_canonical && r.target_name == target_canonical)
                        || (r.source_name == target_canonical && r.target_name == source_canonical)
                })
        };

        found.ok_or_else(|| crate::error::Error::RelationshipNotFound {
            source: source.to_string(),
            target: target.to_string(),
            directed: Some(directed),
        })
    }
}

fn relationship_ids_for_claims(
    conn: &Connection,
    source_canonical: &str,
    target_canonical: &str,
    directed: Option<bool>,
) -> Result<Vec<i64>> {
    let mut rel_ids = Vec::new();
    match directed {
        None => {
            rel_ids.extend(relationship_ids_alias_expanded(
                conn,
                source_canonical,
                target_canonical,
                false,
            )?);
            rel_ids.extend(relationship_ids_alias_expanded(
                conn,
                source_canonical,
                target_canonical,
                true,
            )?);
            rel_ids.extend(relationship_ids_alias_expanded(
                conn,
                target_canonical,
                source_canonical,
                true,
            )?);
        }
        Some(true) => {
            rel_ids.extend(relationship_ids_alias_expanded(
                conn,
                source_canonical,
                target_canonical,
                true,
            )?);
        }
        Some(false) => {
            rel_ids.extend(relationship_ids_alias_expanded(
                conn,
                source_canonical,
                target_canonical,
                false,
            )?);
        }
    }
    Ok(rel_ids)
}

fn row_to_claim(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClaimRecord> {
    Ok(ClaimRecord {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        relationship_id: row.get(2)?,
        content: row.get(3)?,
        source: row.get(4)?,
        claim_date: parse_timestamp(&row.get::<_, String>(5)?),
        date_added: parse_timestamp(&row.get::<_, String>(6)?),
    })
}

pub(super) fn get_entity_locked(conn: &Connection, canonical: &str) -> Result<Option<EntityRecord>> {
    use rusqlite::OptionalExtension;
    let record = conn
        .query_row(
            "SELECT id, name, entity_type, date_added FROM entities WHERE name = ?1",
            [canonical],
            |row| {
                Ok(EntityRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    entity_type: row.get(2)?,
                    date_added: parse_timestamp(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()?;
    Ok(record)
}
