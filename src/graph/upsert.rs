//! Insert-or-update operations: entities, relationships, aliases, claims.
//!
//! Ported from `upsert_entity`/`upsert_relationship`/`upsert_alias`/
//! `upsert_claim` in the original Python `GraphIndex`. Each public method
//! here wraps its body in a single `rusqlite::Transaction` so the
//! guard-reads (alias resolution, collision checks) and the write commit or
//! roll back together.

use super::alias::{has_relationship_between, normalize_pair, resolve_alias_locked};
use super::{GraphIndex, acquire_lock};
use crate::error::{Error, Result};
use crate::models::graph::ClaimOwner;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Transaction, params};

impl GraphIndex {
    /// Inserts an entity, or updates its `entity_type` if it already exists.
    ///
    /// `entity_type` is only applied when `Some`; an existing entity's type
    /// is left unchanged by a later `upsert_entity(name, None)` call.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn upsert_entity(&self, name: &str, entity_type: Option<&str>) -> Result<i64> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        let id = upsert_entity_tx(&tx, name, entity_type)?;
        tx.commit()?;
        metrics::counter!("claimgraph_entity_upserts_total").increment(1);
        Ok(id)
    }

    /// Inserts a relationship between `source` and `target`, or updates its
    /// `strength` if one already exists under the same directedness.
    ///
    /// Both endpoints are resolved to their canonical entity first, and both
    /// are upserted as entities if they don't already exist. Undirected
    /// relationships are stored with the smaller entity id first so there is
    /// exactly one row per unordered pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RelationshipCollision`] if `source` and `target`
    /// resolve to the same canonical entity.
    #[tracing::instrument(skip(self))]
    pub fn upsert_relationship(
        &self,
        source: &str,
        target: &str,
        strength: f64,
        directed: bool,
    ) -> Result<i64> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        let id = upsert_relationship_tx(&tx, source, target, strength, directed)?;
        tx.commit()?;
        metrics::counter!("claimgraph_relationship_upserts_total").increment(1);
        Ok(id)
    }

    /// Registers `alias` as an alternate name for `entity_name`.
    ///
    /// `entity_name` must already be canonical (not itself an alias), and
    /// `alias` must not already map to a different entity. Aliases that also
    /// happen to exist as their own entity row are allowed — they are
    /// reconciled virtually by every load/delete path and can be physically
    /// merged with [`GraphIndex::merge_alias`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RelationshipCollision`] if a relationship already
    /// exists between `entity_name` and `alias`, or [`Error::AliasConflict`]
    /// for a self-alias, a transitive alias, or an alias already bound
    /// elsewhere.
    #[tracing::instrument(skip(self))]
    pub fn upsert_alias(&self, entity_name: &str, alias: &str) -> Result<i64> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        let id = upsert_alias_tx(&tx, entity_name, alias)?;
        tx.commit()?;
        metrics::counter!("claimgraph_alias_upserts_total").increment(1);
        Ok(id)
    }

    /// Inserts a claim bound to exactly one owner: an entity or a
    /// relationship.
    ///
    /// If `claim_date` fails to parse as ISO-8601, it silently falls back to
    /// the current UTC time (matching the original's deliberately forgiving
    /// ingestion behavior; see `SPEC_FULL.md` for why this wasn't hardened).
    ///
    /// # Errors
    ///
    /// Returns an error if the owner's entity or relationship cannot be
    /// upserted.
    #[tracing::instrument(skip(self, content))]
    pub fn upsert_claim(
        &self,
        content: &str,
        source: Option<&str>,
        owner: ClaimOwner<'_>,
        claim_date: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        let id = upsert_claim_tx(&tx, content, source, owner, claim_date)?;
        tx.commit()?;
        metrics::counter!("claimgraph_claim_upserts_total").increment(1);
        Ok(id)
    }
}

pub(super) fn upsert_entity_tx(
    tx: &Transaction<'_>,
    name: &str,
    entity_type: Option<&str>,
) -> Result<i64> {
    let id = tx.query_row(
        "INSERT INTO entities (name, entity_type, date_added)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(name)
         DO UPDATE SET entity_type = COALESCE(excluded.entity_type, entities.entity_type)
         RETURNING id",
        params![name, entity_type, Utc::now().to_rfc3339()],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub(super) fn upsert_relationship_tx(
    tx: &Transaction<'_>,
    source: &str,
    target: &str,
    strength: f64,
    directed: bool,
) -> Result<i64> {
    let source_canonical = resolve_alias_locked(tx, source)?;
    let target_canonical = resolve_alias_locked(tx, target)?;

    if source_canonical == target_canonical {
        return Err(Error::RelationshipCollision {
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    let source_id = upsert_entity_tx(tx, &source_canonical, None)?;
    let target_id = upsert_entity_tx(tx, &target_canonical, None)?;

    let (source_id, target_id, directed) = normalize_pair(source_id, target_id, directed);

    let id = tx.query_row(
        "INSERT INTO relationships (source_id, target_id, strength, directed, date_added)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(source_id, target_id, directed)
         DO UPDATE SET strength = excluded.strength
         RETURNING id",
        params![
            source_id,
            target_id,
            strength,
            i64::from(directed),
            Utc::now().to_rfc3339()
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub(super) fn upsert_alias_tx(tx: &Transaction<'_>, entity_name: &str, alias: &str) -> Result<i64> {
    if has_relationship_between(tx, entity_name, alias)? {
        return Err(Error::RelationshipCollision {
            source: entity_name.to_string(),
            target: alias.to_string(),
        });
    }
    if entity_name == alias {
        return Err(Error::AliasConflict {
            kind: crate::models::graph::AliasConflictKind::SelfAlias,
            alias: alias.to_string(),
            entity: entity_name.to_string(),
            detail: format!("cannot self-alias '{entity_name}' to '{alias}'"),
        });
    }

    let canonical = resolve_alias_locked(tx, entity_name)?;
    if entity_name != canonical {
        return Err(Error::AliasConflict {
            kind: crate::models::graph::AliasConflictKind::Transitive,
            alias: alias.to_string(),
            entity: entity_name.to_string(),
            detail: format!(
                "cannot set an alias of '{entity_name}' because it is itself an alias of \
                 '{canonical}'; instead set '{alias}' as an alias of '{canonical}'"
            ),
        });
    }

    let entity_id = upsert_entity_tx(tx, entity_name, None)?;

    let existing_owner: Option<i64> = tx
        .query_row(
            "SELECT entity_id FROM aliases WHERE alias = ?1",
            [alias],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(owner_id) = existing_owner {
        if owner_id != entity_id {
            let existing_entity: String = tx.query_row(
                "SELECT name FROM entities WHERE id = ?1",
                [owner_id],
                |row| row.get(0),
            )?;
            return Err(Error::AliasConflict {
                kind: crate::models::graph::AliasConflictKind::AlreadyMappedElsewhere,
                alias: alias.to_string(),
                entity: entity_name.to_string(),
                detail: format!("'{alias}' is already mapped to '{existing_entity}'"),
            });
        }
    }

    tx.execute(
        "INSERT INTO aliases (entity_id, alias, date_added)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(alias) DO NOTHING",
        params![entity_id, alias, Utc::now().to_rfc3339()],
    )?;

    let id = tx.query_row(
        "SELECT id FROM aliases WHERE alias = ?1",
        [alias],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub(super) fn upsert_claim_tx(
    tx: &Transaction<'_>,
    content: &str,
    source: Option<&str>,
    owner: ClaimOwner<'_>,
    claim_date: Option<DateTime<Utc>>,
) -> Result<i64> {
    let (entity_id, relationship_id) = match owner {
        ClaimOwner::Entity(name) => {
            let id = upsert_entity_tx(tx, name, None)?;
            (Some(id), None)
        }
        ClaimOwner::Relationship {
            source: src,
            target,
            strength,
            directed,
        } => {
            let id = upsert_relationship_tx(tx, src, target, strength, directed)?;
            (None, Some(id))
        }
    };

    let claim_date = claim_date.unwrap_or_else(Utc::now);

    let id = tx.query_row(
        "INSERT INTO claims (entity_id, relationship_id, content, source, claim_date, date_added)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
        params![
            entity_id,
            relationship_id,
            content,
            source,
            claim_date.to_rfc3339(),
            Utc::now().to_rfc3339()
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}
