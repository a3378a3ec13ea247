//! Physically merging an alias entity into its canonical entity.
//!
//! Ported from `merge_alias`/`merge_all_aliases` in the original Python
//! `GraphIndex`.

use super::alias::{entity_id_by_name, normalize_pair, resolve_alias_locked};
use super::{GraphIndex, acquire_lock};
use crate::error::{Error, Result};
use crate::models::graph::{MergeOutcome, MergeStrategy};
use rusqlite::{OptionalExtension, Transaction, params};

impl GraphIndex {
    /// Physically merges the entity row for `alias_name` into
    /// `canonical_name`, leaving the alias mapping itself in place.
    ///
    /// Relationships that touched the alias-entity are rewritten to point at
    /// the canonical entity (re-normalizing undirected endpoint order); when
    /// the canonical already has an equivalent edge, the alias-entity's
    /// claims are reassigned to the existing row and the alias-entity's edge
    /// is dropped. Claims directly on the alias-entity are reassigned to the
    /// canonical entity. If `alias_name` has no entity row at all (a pure
    /// alias string that was never itself an entity), this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] if `canonical_name` doesn't exist,
    /// an error if `alias_name` is not in fact an alias of `canonical_name`,
    /// or [`Error::RelationshipMergeConflict`] if rewriting an edge would
    /// collapse it into a self-loop.
    #[tracing::instrument(skip(self))]
    pub fn merge_alias(&self, canonical_name: &str, alias_name: &str) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction()?;
        merge_alias_tx(&tx, canonical_name, alias_name)?;
        tx.commit()?;
        metrics::counter!("claimgraph_alias_merges_total").increment(1);
        Ok(())
    }

    /// Merges every alias currently registered against `canonical_name`.
    ///
    /// With [`MergeStrategy::ErrorOnConflict`] (the default), the first
    /// failing merge aborts the whole call and no further aliases are
    /// attempted. With [`MergeStrategy::SkipOnConflict`], a failing merge is
    /// recorded in the outcome's `skipped` list and the remaining aliases
    /// are still attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if [`MergeStrategy::ErrorOnConflict`] is used and any
    /// alias fails to merge.
    #[tracing::instrument(skip(self))]
    pub fn merge_all_aliases(
        &self,
        canonical_name: &str,
        strategy: MergeStrategy,
    ) -> Result<MergeOutcome> {
        let aliases = self.load_aliases(canonical_name)?;

        let mut merged = Vec::new();
        let mut skipped = Vec::new();

        for alias in aliases {
            match self.merge_alias(canonical_name, &alias) {
                Ok(()) => merged.push(alias),
                Err(e) => match strategy {
                    MergeStrategy::ErrorOnConflict => return Err(e),
                    MergeStrategy::SkipOnConflict => {
                        tracing::warn!(%alias, error = %e, "skipping alias merge");
                        skipped.push((alias, e.to_string()));
                    }
                },
            }
        }

        Ok(MergeOutcome { merged, skipped })
    }
}

fn merge_alias_tx(tx: &Transaction<'_>, canonical_name: &str, alias_name: &str) -> Result<()> {
    let canonical_id = match entity_id_by_name(tx, canonical_name)? {
        Some(id) => id,
        None => {
            let resolved = resolve_alias_locked(tx, canonical_name)?;
            return Err(Error::EntityNotFound {
                name: canonical_name.to_string(),
                hint: if resolved != canonical_name {
                    Some(format!("it looks like an alias of '{resolved}'"))
                } else {
                    None
                },
            });
        }
    };

    let alias_owner: Option<i64> = tx
        .query_row(
            "SELECT entity_id FROM aliases WHERE alias = ?1",
            [alias_name],
            |row| row.get(0),
        )
        .optional()?;
    match alias_owner {
        None => {
            return Err(Error::InvalidArgument(format!(
                "'{alias_name}' is not an alias"
            )));
        }
        Some(owner_id) if owner_id != canonical_id => {
            return Err(Error::InvalidArgument(format!(
                "'{alias_name}' is not an alias of '{canonical_name}'"
            )));
        }
        _ => {}
    }

    let Some(alias_id) = entity_id_by_name(tx, alias_name)? else {
        tracing::info!(alias = alias_name, "alias has no entity data to merge");
        return Ok(());
    };

    let mut stmt = tx.prepare(
        "SELECT id, source_id, target_id, strength, directed FROM relationships
         WHERE source_id = ?1 OR target_id = ?1",
    )?;
    let rels: Vec<(i64, i64, i64, f64, i64)> = stmt
        .query_map([alias_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })?
        .collect::<std::result::Result<_, _>>()?;
    drop(stmt);

    for (rel_id, source_id, target_id, _strength, directed_int) in rels {
        let new_source_id = if source_id == alias_id {
            canonical_id
        } else {
            source_id
        };
        let new_target_id = if target_id == alias_id {
            canonical_id
        } else {
            target_id
        };

        if new_source_id == new_target_id {
            return Err(Error::RelationshipMergeConflict {
                canonical: canonical_name.to_string(),
                alias: alias_name.to_string(),
            });
        }

        let (new_source_id, new_target_id, directed) =
            normalize_pair(new_source_id, new_target_id, directed_int != 0);

        let existing_rel: Option<i64> = tx
            .query_row(
                "SELECT id FROM relationships WHERE source_id = ?1 AND target_id = ?2 AND directed = ?3",
                params![new_source_id, new_target_id, i64::from(directed)],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing_id) = existing_rel {
            tx.execute(
                "UPDATE claims SET relationship_id = ?1 WHERE relationship_id = ?2",
                params![existing_id, rel_id],
            )?;
            tx.execute("DELETE FROM relationships WHERE id = ?1", [rel_id])?;
        } else {
            tx.execute(
                "UPDATE relationships SET source_id = ?1, target_id = ?2, directed = ?3 WHERE id = ?4",
                params![new_source_id, new_target_id, i64::from(directed), rel_id],
            )?;
        }
    }

    tx.execute(
        "UPDATE claims SET entity_id = ?1 WHERE entity_id = ?2",
        params![canonical_id, alias_id],
    )?;
    tx.execute("DELETE FROM entities WHERE id = ?1", [alias_id])?;

    tracing::info!(canonical = canonical_name, alias = alias_name, "merged alias entity");
    Ok(())
}
