//! Deletion operations and the cascade rules around them.
//!
//! Ported from `delete_entity`/`delete_relationship`/`delete_alias`/
//! `delete_claim`/`drop` in the original Python `GraphIndex`.

use super::alias::{expand_ids, placeholders, relationship_ids_alias_expanded, resolve_alias_locked};
use super::{GraphIndex, acquire_lock};
use crate::error::{Error, Result};
use crate::models::graph::{AliasConflictKind, DeleteClaimFilter};
use rusqlite::{OptionalExtension, Transaction, params_from_iter};

impl GraphIndex {
    /// Deletes a canonical entity and, if `cascade` is set, everything that
    /// depends on it.
    ///
    /// If `name` is itself an alias, this refuses and points at the
    /// canonical name instead of deleting anything. With `cascade = false`,
    /// the call is refused if the canonical entity (or any of its
    /// alias-entities) has relationships, or if the canonical entity has
    /// claims. With `cascade = true`, relationships where the *canonical*
    /// id is an endpoint are deleted along with their claims (relationships
    /// belonging only to an alias-entity are left untouched — merge the
    /// alias first if those should be swept up too), the canonical entity's
    /// own claims and alias mappings are deleted, then the entity row
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeletionConflict`] if `name` is an alias, or if
    /// `cascade = false` and the entity has dependents. Returns
    /// [`Error::EntityNotFound`] if the canonical entity does not exist.
    #[tracing::instrument(skip(self))]
    pub fn delete_entity(&self, name: &str, cascade: bool) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        delete_entity_tx(&tx, name, cascade)?;
        tx.commit()?;
        metrics::counter!("claimgraph_entity_deletes_total").increment(1);
        Ok(())
    }

    /// Deletes every relationship between the alias-expanded families of
    /// `source` and `target`.
    ///
    /// `directed = None` removes both the undirected edge and either
    /// directed orientation between the two families. A call that matches
    /// no relationships is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RelationshipCollision`] if `source` and `target`
    /// resolve to the same canonical entity, or [`Error::DeletionConflict`]
    /// if `cascade = false` and any matched relationship has claims.
    #[tracing::instrument(skip(self))]
    pub fn delete_relationship(
        &self,
        source: &str,
        target: &str,
        directed: Option<bool>,
        cascade: bool,
    ) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        delete_relationship_tx(&tx, source, target, directed, cascade)?;
        tx.commit()?;
        metrics::counter!("claimgraph_relationship_deletes_total").increment(1);
        Ok(())
    }

    /// Deletes a single alias mapping. The entity `alias` names (if it has
    /// its own entity row) is left untouched — only the mapping row is
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeletionConflict`] if `entity_name` is itself an
    /// alias, [`Error::EntityNotFound`] if `entity_name` does not exist, or
    /// [`Error::AliasConflict`] if `alias` is unmapped or mapped to a
    /// different entity.
    #[tracing::instrument(skip(self))]
    pub fn delete_alias(&self, entity_name: &str, alias: &str) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        delete_alias_tx(&tx, entity_name, alias)?;
        tx.commit()?;
        metrics::counter!("claimgraph_alias_deletes_total").increment(1);
        Ok(())
    }

    /// Deletes claims matching `filter`. Claims have no dependents, so there
    /// is no cascade to reason about. A filter that matches nothing is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn delete_claim(&self, filter: DeleteClaimFilter<'_>) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        delete_claim_tx(&tx, filter)?;
        tx.commit()?;
        metrics::counter!("claimgraph_claim_deletes_total").increment(1);
        Ok(())
    }

    /// Deletes every row from every table: claims, relationships, aliases,
    /// entities, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying database operation fails.
    #[tracing::instrument(skip(self))]
    pub fn drop_all(&self) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM claims", [])?;
        tx.execute("DELETE FROM relationships", [])?;
        tx.execute("DELETE FROM aliases", [])?;
        tx.execute("DELETE FROM entities", [])?;
        tx.commit()?;
        Ok(())
    }
}

fn delete_entity_tx(tx: &Transaction<'_>, name: &str, cascade: bool) -> Result<()> {
    let canonical = resolve_alias_locked(tx, name)?;
    if name != canonical {
        return Err(Error::DeletionConflict {
            subject: name.to_string(),
            relation: "entities",
            detail: format!(
                "'{name}' is an alias of '{canonical}'; delete the canonical entity \
                 '{canonical}' instead, or remove the '{name}' alias first"
            ),
        });
    }

    let canonical_id = tx
        .query_row(
            "SELECT id FROM entities WHERE name = ?1",
            [&canonical],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .ok_or_else(|| Error::EntityNotFound {
            name: canonical.clone(),
            hint: None,
        })?;

    let expanded_ids = expand_ids(tx, &canonical)?;
    let ps = placeholders(expanded_ids.len());
    let rel_guard_sql = format!(
        "SELECT id FROM relationships WHERE source_id IN ({ps}) OR target_id IN ({ps})"
    );
    let mut stmt = tx.prepare(&rel_guard_sql)?;
    let rel_count: usize = stmt
        .query_map(
            params_from_iter(expanded_ids.iter().chain(expanded_ids.iter())),
            |row| row.get::<_, i64>(0),
        )?
        .count();
    drop(stmt);

    let claim_count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM claims WHERE entity_id = ?1",
        [canonical_id],
        |row| row.get(0),
    )?;

    if !cascade {
        match (rel_count > 0, claim_count > 0) {
            (true, true) => {
                return Err(Error::DeletionConflict {
                    subject: canonical.clone(),
                    relation: "entities",
                    detail: format!(
                        "entity '{canonical}' has {rel_count} relationships and \
                         {claim_count} claims; use cascade or clean up manually"
                    ),
                });
            }
            (true, false) => {
                return Err(Error::DeletionConflict {
                    subject: canonical.clone(),
                    relation: "entities",
                    detail: format!(
                        "entity '{canonical}' has {rel_count} relationships; \
                         use cascade or clean up manually"
                    ),
                });
            }
            (false, true) => {
                return Err(Error::DeletionConflict {
                    subject: canonical.clone(),
                    relation: "entities",
                    detail: format!(
                        "entity '{canonical}' has {claim_count} claims; \
                         use cascade or clean up manually"
                    ),
                });
            }
            (false, false) => {}
        }
    }

    let mut stmt = tx.prepare(
        "SELECT id FROM relationships WHERE source_id = ?1 OR target_id = ?1",
    )?;
    let rel_ids: Vec<i64> = stmt
        .query_map([canonical_id], |row| row.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    drop(stmt);

    for rel_id in rel_ids {
        tx.execute("DELETE FROM claims WHERE relationship_id = ?1", [rel_id])?;
        tx.execute("DELETE FROM relationships WHERE id = ?1", [rel_id])?;
    }

    tx.execute("DELETE FROM claims WHERE entity_id = ?1", [canonical_id])?;
    tx.execute("DELETE FROM aliases WHERE entity_id = ?1", [canonical_id])?;
    tx.execute("DELETE FROM entities WHERE id = ?1", [canonical_id])?;

    Ok(())
}

fn relationship_ids_for_delete(
    tx: &Transaction<'_>,
    source_canonical: &str,
    target_canonical: &str,
    directed: Option<bool>,
) -> Result<Vec<i64>> {
    let mut rel_ids = Vec::new();
    match directed {
        None => {
            rel_ids.extend(relationship_ids_alias_expanded(
                tx,
                source_canonical,
                target_canonical,
                false,
            )?);
            rel_ids.extend(relationship_ids_alias_expanded(
                tx,
                source_canonical,
                target_canonical,
                true,
            )?);
            rel_ids.extend(relationship_ids_alias_expanded(
                tx,
                target_canonical,
                source_canonical,
                true,
            )?);
        }
        Some(true) => {
            rel_ids.extend(relationship_ids_alias_expanded(
                tx,
                source_canonical,
                target_canonical,
                true,
            )?);
        }
        Some(false) => {
            rel_ids.extend(relationship_ids_alias_expanded(
                tx,
                source_canonical,
                target_canonical,
                false,
            )?);
        }
    }
    Ok(rel_ids)
}

fn delete_relationship_tx(
    tx: &Transaction<'_>,
    source: &str,
    target: &str,
    directed: Option<bool>,
    cascade: bool,
) -> Result<()> {
    let source_canonical = resolve_alias_locked(tx, source)?;
    let target_canonical = resolve_alias_locked(tx, target)?;
    if source_canonical == target_canonical {
        return Err(Error::RelationshipCollision {
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    let rel_ids = relationship_ids_for_delete(tx, &source_canonical, &target_canonical, directed)?;
    if rel_ids.is_empty() {
        tracing::info!(
            source = %source_canonical,
            target = %target_canonical,
            "no relationship found to delete"
        );
        return Ok(());
    }

    if !cascade {
        let ps = placeholders(rel_ids.len());
        let sql = format!("SELECT COUNT(*) FROM claims WHERE relationship_id IN ({ps})");
        let claim_count: i64 =
            tx.query_row(&sql, params_from_iter(rel_ids.clone()), |row| row.get(0))?;
        if claim_count > 0 {
            return Err(Error::DeletionConflict {
                subject: source_canonical.clone(),
                relation: "relationships",
                detail: format!(
                    "relationship between '{source_canonical}' and '{target_canonical}' has \
                     {claim_count} claims; use cascade or clean up manually"
                ),
            });
        }
    }

    let ps = placeholders(rel_ids.len());
    tx.execute(
        &format!("DELETE FROM claims WHERE relationship_id IN ({ps})"),
        params_from_iter(rel_ids.clone()),
    )?;
    tx.execute(
        &format!("DELETE FROM relationships WHERE id IN ({ps})"),
        params_from_iter(rel_ids),
    )?;

    Ok(())
}

fn delete_alias_tx(tx: &Transaction<'_>, entity_name: &str, alias: &str) -> Result<()> {
    let canonical = resolve_alias_locked(tx, entity_name)?;
    if canonical != entity_name {
        return Err(Error::DeletionConflict {
            subject: alias.to_string(),
            relation: "aliases",
            detail: format!("'{entity_name}' is an alias of '{canonical}'"),
        });
    }

    let entity_id: i64 = tx
        .query_row(
            "SELECT id FROM entities WHERE name = ?1",
            [entity_name],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::EntityNotFound {
            name: entity_name.to_string(),
            hint: None,
        })?;

    let mapping: Option<(i64, i64)> = tx
        .query_row(
            "SELECT entity_id, id FROM aliases WHERE alias = ?1",
            [alias],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (owner_id, mapping_id) = mapping.ok_or_else(|| Error::AliasConflict {
        kind: AliasConflictKind::Unmapped,
        alias: alias.to_string(),
        entity: entity_name.to_string(),
        detail: format!("'{alias}' is not an alias of '{entity_name}' (no mapping found)"),
    })?;

    if owner_id != entity_id {
        let other_name: String = tx.query_row(
            "SELECT name FROM entities WHERE id = ?1",
            [owner_id],
            |row| row.get(0),
        )?;
        return Err(Error::AliasConflict {
            kind: AliasConflictKind::AlreadyMappedElsewhere,
            alias: alias.to_string(),
            entity: entity_name.to_string(),
            detail: format!("'{alias}' is mapped to '{other_name}', not '{entity_name}'"),
        });
    }

    tx.execute("DELETE FROM aliases WHERE id = ?1", [mapping_id])?;
    Ok(())
}

fn entity_clause(tx: &Transaction<'_>, name: &str) -> Result<Option<(String, i64)>> {
    let canonical = resolve_alias_locked(tx, name)?;
    let id: Option<i64> = tx
        .query_row(
            "SELECT id FROM entities WHERE name = ?1",
            [&canonical],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.map(|id| ("entity_id = ?".to_string(), id)))
}

fn delete_claim_tx(tx: &Transaction<'_>, filter: DeleteClaimFilter<'_>) -> Result<()> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<rusqlite::types::Value> = Vec::new();

    match filter {
        DeleteClaimFilter::ByEntity(name) => {
            let Some((clause, id)) = entity_clause(tx, name)? else {
                return Ok(());
            };
            clauses.push(clause);
            params.push(rusqlite::types::Value::Integer(id));
        }
        DeleteClaimFilter::ByRelationship {
            source,
            target,
            directed,
        } => {
            let rel_ids = relationship_ids_for_claim_filter(tx, source, target, directed)?;
            if rel_ids.is_empty() {
                return Ok(());
            }
            let ps = placeholders(rel_ids.len());
            clauses.push(format!("relationship_id IN ({ps})"));
            params.extend(rel_ids.into_iter().map(rusqlite::types::Value::Integer));
        }
        DeleteClaimFilter::BySource(source) => {
            clauses.push("source = ?".to_string());
            params.push(rusqlite::types::Value::Text(source.to_string()));
        }
        DeleteClaimFilter::ByDate { lo, hi } => {
            clauses.push("date_added BETWEEN ? AND ?".to_string());
            params.push(rusqlite::types::Value::Text(lo.to_rfc3339()));
            params.push(rusqlite::types::Value::Text(hi.to_rfc3339()));
        }
        DeleteClaimFilter::ByContent(content) => {
            clauses.push("content = ?".to_string());
            params.push(rusqlite::types::Value::Text(content.to_string()));
        }
        DeleteClaimFilter::Exact {
            entity_name,
            relationship,
            directed,
            source,
            date_range,
            content,
        } => {
            if let Some(name) = entity_name {
                let Some((clause, id)) = entity_clause(tx, name)? else {
                    return Ok(());
                };
                clauses.push(clause);
                params.push(rusqlite::types::Value::Integer(id));
            }
            if let Some((source, target)) = relationship {
                let rel_ids = relationship_ids_for_claim_filter(tx, source, target, directed)?;
                if rel_ids.is_empty() {
                    return Ok(());
                }
                let ps = placeholders(rel_ids.len());
                clauses.push(format!("relationship_id IN ({ps})"));
                params.extend(rel_ids.into_iter().map(rusqlite::types::Value::Integer));
            }
            if let Some(content) = content {
                clauses.push("content = ?".to_string());
                params.push(rusqlite::types::Value::Text(content.to_string()));
            }
            if let Some(source) = source {
                clauses.push("source = ?".to_string());
                params.push(rusqlite::types::Value::Text(source.to_string()));
            }
            if let Some((lo, hi)) = date_range {
                clauses.push("date_added BETWEEN ? AND ?".to_string());
                params.push(rusqlite::types::Value::Text(lo.to_rfc3339()));
                params.push(rusqlite::types::Value::Text(hi.to_rfc3339()));
            }
        }
    }

    if clauses.is_empty() {
        return Ok(());
    }

    let sql = format!("DELETE FROM claims WHERE {}", clauses.join(" AND "));
    tx.execute(&sql, params_from_iter(params))?;
    Ok(())
}

fn relationship_ids_for_claim_filter(
    tx: &Transaction<'_>,
    source: &str,
    target: &str,
    directed: Option<bool>,
) -> Result<Vec<i64>> {
    relationship_ids_for_delete(tx, source, target, directed)
}
