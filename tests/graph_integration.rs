//! End-to-end tests against a real `SQLite` file, covering the seven
//! literal scenarios the store's semantics are built around: alias
//! expansion, undirected normalization, collisions, cascading deletes, and
//! physical merges.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use claimgraph::config::GraphConfig;
use claimgraph::error::Error;
use claimgraph::graph::GraphIndex;
use claimgraph::models::graph::{ClaimOwner, DeleteClaimFilter, MergeStrategy};
use tempfile::TempDir;
use test_case::test_case;

fn open_index(dir: &TempDir) -> GraphIndex {
    let path = dir.path().join("graph.db");
    GraphIndex::open(GraphConfig::at(path)).expect("failed to open graph index")
}

#[test]
fn entity_upsert_preserves_type_on_later_upsert_without_one() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_entity("FBI", Some("organization")).unwrap();
    index.upsert_entity("FBI", None).unwrap();

    let record = index.get_entity("FBI").unwrap().expect("entity should exist");
    assert_eq!(record.entity_type.as_deref(), Some("organization"));
}

#[test]
fn alias_resolves_to_canonical_and_expands_in_claims_and_relationships() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_entity("FBI", None).unwrap();
    index
        .upsert_alias("FBI", "Federal Bureau of Investigation")
        .unwrap();

    assert_eq!(
        index.resolve_alias("Federal Bureau of Investigation").unwrap(),
        "FBI"
    );
    assert_eq!(index.resolve_alias("FBI").unwrap(), "FBI");

    // A relationship recorded against the alias name is stored/queried under
    // the canonical entity.
    index
        .upsert_relationship("Federal Bureau of Investigation", "CIA", 0.5, false)
        .unwrap();
    let rels = index.load_relationships("FBI", None, None).unwrap();
    assert_eq!(rels.len(), 1);
    assert!(
        (rels[0].source_name == "FBI" && rels[0].target_name == "CIA")
            || (rels[0].source_name == "CIA" && rels[0].target_name == "FBI")
    );

    // A claim recorded against the alias name is visible via the canonical.
    index
        .upsert_claim(
            "investigates organized crime",
            Some("wikipedia"),
            ClaimOwner::Entity("Federal Bureau of Investigation"),
            None,
        )
        .unwrap();
    let claims = index.load_entity_claims("FBI").unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].content, "investigates organized crime");
}

#[test]
fn undirected_relationship_is_order_independent() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_relationship("Alice", "Bob", 1.0, false).unwrap();
    // Re-upserting with endpoints swapped should update the same row, not
    // create a second one.
    index.upsert_relationship("Bob", "Alice", 2.0, false).unwrap();

    let rels = index.load_relationships("Alice", None, None).unwrap();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].strength, 2.0);
}

#[test]
fn self_alias_or_relationship_collision_is_rejected() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_entity("Alice", None).unwrap();
    let err = index.upsert_alias("Alice", "Alice").unwrap_err();
    assert!(matches!(err, Error::AliasConflict { .. }));

    index.upsert_relationship("Alice", "Bob", 0.0, false).unwrap();
    let err = index.upsert_alias("Alice", "Bob").unwrap_err();
    assert!(matches!(err, Error::RelationshipCollision { .. }));

    let err = index.upsert_relationship("Bob", "Bob", 0.0, false).unwrap_err();
    assert!(matches!(err, Error::RelationshipCollision { .. }));
}

#[test]
fn deleting_an_alias_is_refused_in_favor_of_the_canonical() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_entity("FBI", None).unwrap();
    index.upsert_alias("FBI", "Bureau").unwrap();

    let err = index.delete_entity("Bureau", true).unwrap_err();
    assert!(matches!(err, Error::DeletionConflict { .. }));

    // The canonical can still be deleted directly.
    index.delete_entity("FBI", true).unwrap();
    assert!(!index.entity_exists("FBI").unwrap());
}

#[test]
fn cascade_delete_removes_relationships_and_claims_but_not_alias_only_edges() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    // "Bureau" starts as an independent entity with its own edge to
    // Interpol. Only once that edge exists does it get registered as an
    // alias of FBI — `upsert_relationship` always resolves through the
    // alias table, so creating the edge in the other order would attach it
    // to the canonical instead of the alias-entity.
    index.upsert_entity("Bureau", None).unwrap();
    index.upsert_relationship("Bureau", "Interpol", 0.0, false).unwrap();

    index.upsert_entity("FBI", None).unwrap();
    index.upsert_alias("FBI", "Bureau").unwrap();
    index.upsert_relationship("FBI", "CIA", 0.0, false).unwrap();
    index
        .upsert_claim("investigates fraud", None, ClaimOwner::Entity("FBI"), None)
        .unwrap();

    index.delete_entity("FBI", true).unwrap();

    assert!(!index.entity_exists("FBI").unwrap());
    // The alias-entity "Bureau" and its own edge to Interpol survive — only
    // relationships touching the canonical id are cascaded.
    assert!(index.entity_exists("Bureau").unwrap());
    let remaining = index.dump_all_relationships().unwrap();
    assert!(
        remaining
            .iter()
            .any(|r| r.source_name == "Bureau" || r.target_name == "Bureau")
    );
    assert!(
        !remaining
            .iter()
            .any(|r| r.source_name == "CIA" || r.target_name == "CIA")
    );
}

#[test]
fn delete_entity_without_cascade_is_blocked_by_dependents() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_relationship("Alice", "Bob", 0.0, false).unwrap();
    let err = index.delete_entity("Alice", false).unwrap_err();
    assert!(matches!(err, Error::DeletionConflict { .. }));
}

#[test]
fn merge_alias_moves_relationships_claims_and_drops_the_alias_entity() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    // "Bureau" starts independent, with its own relationship and claim,
    // and only afterwards becomes a registered alias of FBI.
    index.upsert_entity("Bureau", None).unwrap();
    index.upsert_relationship("Bureau", "Interpol", 0.7, false).unwrap();
    index
        .upsert_claim("shares intelligence", None, ClaimOwner::Entity("Bureau"), None)
        .unwrap();

    index.upsert_entity("FBI", None).unwrap();
    index.upsert_alias("FBI", "Bureau").unwrap();

    index.merge_alias("FBI", "Bureau").unwrap();

    // The alias-entity row is gone but the mapping remains.
    assert!(!index.entity_exists("Bureau").unwrap());
    assert_eq!(index.resolve_alias("Bureau").unwrap(), "FBI");

    let rels = index.load_relationships("FBI", None, None).unwrap();
    assert!(rels.iter().any(|r| r.source_name == "Interpol" || r.target_name == "Interpol"));

    let claims = index.load_entity_claims("FBI").unwrap();
    assert!(claims.iter().any(|c| c.content == "shares intelligence"));
}

#[test]
fn merge_all_aliases_skip_on_conflict_records_failures_without_aborting() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    // "Bureau" and "G-Men" start as independent entities with a direct
    // relationship between them, before either becomes an alias of FBI.
    // Merging "Bureau" in first rewrites that edge to FBI<->G-Men; merging
    // "G-Men" in next would then collapse that same edge into a self-loop,
    // so it must be skipped rather than aborting the whole call.
    index.upsert_entity("Bureau", None).unwrap();
    index.upsert_entity("G-Men", None).unwrap();
    index.upsert_relationship("Bureau", "G-Men", 0.0, false).unwrap();

    index.upsert_entity("FBI", None).unwrap();
    index.upsert_alias("FBI", "Bureau").unwrap();
    index.upsert_alias("FBI", "G-Men").unwrap();

    let outcome = index
        .merge_all_aliases("FBI", MergeStrategy::SkipOnConflict)
        .unwrap();

    assert_eq!(outcome.merged, vec!["Bureau".to_string()]);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].0, "G-Men");
}

#[test]
fn delete_claim_by_date_range_filters_date_added_not_claim_date() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_entity("Alice", None).unwrap();
    index
        .upsert_claim("first claim", None, ClaimOwner::Entity("Alice"), None)
        .unwrap();

    let now = chrono::Utc::now();
    let lo = now - chrono::Duration::hours(1);
    let hi = now + chrono::Duration::hours(1);

    index
        .delete_claim(DeleteClaimFilter::ByDate { lo, hi })
        .unwrap();

    let claims = index.load_entity_claims("Alice").unwrap();
    assert!(claims.is_empty());
}

#[test]
fn delete_relationship_is_idempotent_on_a_no_op_match() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    // No relationship exists yet between these two names; deleting twice
    // must not error either time.
    index.delete_relationship("Alice", "Bob", None, true).unwrap();
    index.delete_relationship("Alice", "Bob", None, true).unwrap();
}

#[test]
fn drop_all_empties_every_relation() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_entity("Alice", None).unwrap();
    index.upsert_relationship("Alice", "Bob", 0.0, false).unwrap();
    index
        .upsert_claim("note", None, ClaimOwner::Entity("Alice"), None)
        .unwrap();

    index.drop_all().unwrap();

    assert!(index.list_all_entities().unwrap().is_empty());
    assert!(index.dump_all_relationships().unwrap().is_empty());
    assert!(index.dump_all_claims().unwrap().is_empty());
}

// The three directedness-matching cases from `spec.md` §4.4, exercised via
// `load_relationship_claims` (a two-sided, alias-expanded lookup): `Some(false)`
// matches only claims on the undirected edge, `Some(true)` matches only
// claims on the src->tgt directed edge, and `None` unions the undirected
// edge plus both directed orientations between the two names.
#[test_case(None, 3; "null directedness unions undirected and both directed orientations")]
#[test_case(Some(false), 1; "false matches only the undirected edge's claims")]
#[test_case(Some(true), 1; "true matches only the src-to-tgt directed edge's claims")]
fn load_relationship_claims_directedness_filter_matches_spec_rules(
    directed: Option<bool>,
    expected_count: usize,
) {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index
        .upsert_claim(
            "undirected claim",
            None,
            ClaimOwner::Relationship {
                source: "Alice",
                target: "Bob",
                strength: 1.0,
                directed: false,
            },
            None,
        )
        .unwrap();
    index
        .upsert_claim(
            "alice to bob claim",
            None,
            ClaimOwner::Relationship {
                source: "Alice",
                target: "Bob",
                strength: 1.0,
                directed: true,
            },
            None,
        )
        .unwrap();
    index
        .upsert_claim(
            "bob to alice claim",
            None,
            ClaimOwner::Relationship {
                source: "Bob",
                target: "Alice",
                strength: 1.0,
                directed: true,
            },
            None,
        )
        .unwrap();

    let claims = index
        .load_relationship_claims("Alice", "Bob", directed)
        .unwrap();
    assert_eq!(claims.len(), expected_count);
}

#[test]
fn get_relationship_finds_exact_match_and_errors_when_absent() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    index.upsert_relationship("Alice", "Bob", 0.5, false).unwrap();

    let found = index.get_relationship("Alice", "Bob", false).unwrap();
    assert_eq!(found.strength, 0.5);
    // Undirected, so the reverse order matches the same edge.
    let found_reverse = index.get_relationship("Bob", "Alice", false).unwrap();
    assert_eq!(found_reverse.strength, 0.5);

    let err = index.get_relationship("Alice", "Bob", true).unwrap_err();
    assert!(matches!(err, Error::RelationshipNotFound { .. }));

    let err = index.get_relationship("Alice", "Alice", false).unwrap_err();
    assert!(matches!(err, Error::RelationshipCollision { .. }));
}
