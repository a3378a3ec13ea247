//! Table/JSON rendering for CLI output, grounded on `commands/graph.rs`'s
//! `print_table`/`println!("{}", serde_json::to_string_pretty(...))` split.

// Allow print_stdout/stderr in CLI module (consistent with main.rs)
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use crate::models::graph::{ClaimRecord, EntityRecord, MergeOutcome, RelationshipRecord};
use clap::ValueEnum;
use serde::Serialize;

/// Output rendering format shared by every `--format` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Serialize)]
struct EntityJson<'a> {
    id: i64,
    name: &'a str,
    entity_type: Option<&'a str>,
    date_added: String,
}

#[derive(Serialize)]
struct RelationshipJson<'a> {
    id: i64,
    source: &'a str,
    target: &'a str,
    strength: f64,
    directed: bool,
    date_added: String,
}

#[derive(Serialize)]
struct ClaimJson<'a> {
    id: i64,
    entity_id: Option<i64>,
    relationship_id: Option<i64>,
    content: &'a str,
    source: Option<&'a str>,
    claim_date: String,
    date_added: String,
}

pub fn print_entity(record: Option<&EntityRecord>, format: OutputFormat) {
    let Some(record) = record else {
        println!("not found");
        return;
    };
    match format {
        OutputFormat::Table => {
            println!("Entity: {}", record.name);
            println!("========{}", "=".repeat(record.name.len()));
            println!("ID:          {}", record.id);
            println!(
                "Type:        {}",
                record.entity_type.as_deref().unwrap_or("-")
            );
            println!("Date added:  {}", record.date_added.to_rfc3339());
        }
        OutputFormat::Json => {
            let json = EntityJson {
                id: record.id,
                name: &record.name,
                entity_type: record.entity_type.as_deref(),
                date_added: record.date_added.to_rfc3339(),
            };
            if let Ok(rendered) = serde_json::to_string_pretty(&json) {
                println!("{rendered}");
            }
        }
    }
}

pub fn print_entity_names(names: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if names.is_empty() {
                println!("No entities found.");
                return;
            }
            for name in names {
                println!("{name}");
            }
            println!();
            println!("{} entities", names.len());
        }
        OutputFormat::Json => {
            if let Ok(rendered) = serde_json::to_string_pretty(names) {
                println!("{rendered}");
            }
        }
    }
}

pub fn print_string_list(items: &[String], format: OutputFormat) {
    print_entity_names(items, format);
}

pub fn print_relationships(relationships: &[RelationshipRecord], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if relationships.is_empty() {
                println!("No relationships found.");
                return;
            }
            println!(
                "{:<24} {:<24} {:>8} {:<8}",
                "SOURCE", "TARGET", "STRENGTH", "DIRECTED"
            );
            println!("{}", "-".repeat(72));
            for rel in relationships {
                println!(
                    "{:<24} {:<24} {:>8.2} {:<8}",
                    rel.source_name, rel.target_name, rel.strength, rel.directed
                );
            }
            println!();
            println!("{} relationships", relationships.len());
        }
        OutputFormat::Json => {
            let json: Vec<RelationshipJson<'_>> = relationships
                .iter()
                .map(|rel| RelationshipJson {
                    id: rel.id,
                    source: &rel.source_name,
                    target: &rel.target_name,
                    strength: rel.strength,
                    directed: rel.directed,
                    date_added: rel.date_added.to_rfc3339(),
                })
                .collect();
            if let Ok(rendered) = serde_json::to_string_pretty(&json) {
                println!("{rendered}");
            }
        }
    }
}

pub fn print_claims(claims: &[ClaimRecord], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if claims.is_empty() {
                println!("No claims found.");
                return;
            }
            for claim in claims {
                println!(
                    "[{}] {} ({})",
                    claim.date_added.to_rfc3339(),
                    claim.content,
                    claim.source.as_deref().unwrap_or("unattributed")
                );
            }
            println!();
            println!("{} claims", claims.len());
        }
        OutputFormat::Json => {
            let json: Vec<ClaimJson<'_>> = claims
                .iter()
                .map(|claim| ClaimJson {
                    id: claim.id,
                    entity_id: claim.entity_id,
                    relationship_id: claim.relationship_id,
                    content: &claim.content,
                    source: claim.source.as_deref(),
                    claim_date: claim.claim_date.to_rfc3339(),
                    date_added: claim.date_added.to_rfc3339(),
                })
                .collect();
            if let Ok(rendered) = serde_json::to_string_pretty(&json) {
                println!("{rendered}");
            }
        }
    }
}

pub fn print_merge_outcome(outcome: &MergeOutcome) {
    println!("Merged {} aliases", outcome.merged.len());
    for alias in &outcome.merged {
        println!("  - {alias}");
    }
    if !outcome.skipped.is_empty() {
        println!("Skipped {} aliases:", outcome.skipped.len());
        for (alias, reason) in &outcome.skipped {
            println!("  - {alias}: {reason}");
        }
    }
}
