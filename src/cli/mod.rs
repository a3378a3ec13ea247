//! CLI command implementations.
//!
//! One subcommand per [`crate::graph::GraphIndex`] method, grouped the way
//! the teacher groups its own `commands/graph.rs` actions (one enum per
//! noun, `table`/`json` output formats). The CLI is a thin wrapper: it
//! never contains graph logic of its own.

// Allow print_stdout/stderr in CLI module (consistent with main.rs)
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

mod output;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::GraphIndex;
use crate::models::graph::{ClaimOwner, DeleteClaimFilter, MergeStrategy};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use output::OutputFormat;

/// claimgraph: a persistent knowledge-graph store.
#[derive(Debug, Parser)]
#[command(name = "claimgraph", version, about)]
pub struct Cli {
    /// Path to the `SQLite` database file. Defaults to the platform data
    /// directory, or `$CLAIMGRAPH_DB_PATH` if set.
    #[arg(long, global = true, env = "CLAIMGRAPH_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Entity operations.
    Entity {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Alias operations.
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
    /// Relationship operations.
    Relationship {
        #[command(subcommand)]
        action: RelationshipAction,
    },
    /// Claim operations.
    Claim {
        #[command(subcommand)]
        action: ClaimAction,
    },
    /// Physically merge one alias entity into its canonical entity.
    Merge {
        /// Canonical entity name.
        canonical: String,
        /// Alias entity name to merge in.
        alias: String,
    },
    /// Physically merge every alias registered against a canonical entity.
    MergeAll {
        /// Canonical entity name.
        canonical: String,
        /// Record conflicting aliases and continue instead of stopping on
        /// the first one (the default is to stop).
        #[arg(long)]
        skip_on_conflict: bool,
    },
    /// Dump the full contents of a relation as JSON.
    Dump {
        #[command(subcommand)]
        what: DumpAction,
    },
    /// Delete every entity, alias, relationship, and claim in the store.
    Drop {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// `entity` subcommands.
#[derive(Debug, Subcommand)]
pub enum EntityAction {
    /// Insert or update an entity.
    Add {
        /// Entity name.
        name: String,
        /// Optional entity type.
        #[arg(short = 't', long)]
        entity_type: Option<String>,
    },
    /// Print an entity's record, resolving aliases first.
    Get {
        /// Entity or alias name.
        name: String,
        #[command(flatten)]
        format: FormatArg,
    },
    /// List every canonical entity name.
    List {
        #[command(flatten)]
        format: FormatArg,
    },
    /// Check whether an entity exists.
    Exists {
        /// Entity name (exact, not alias-resolved).
        name: String,
    },
    /// Delete an entity (and, with cascade, everything incident on it).
    Remove {
        /// Entity or alias name.
        name: String,
        /// Refuse to delete if the entity has relationships or claims.
        #[arg(long, default_value_t = true)]
        cascade: bool,
    },
}

/// `alias` subcommands.
#[derive(Debug, Subcommand)]
pub enum AliasAction {
    /// Register an alias for an entity.
    Add {
        /// Canonical entity name.
        entity: String,
        /// Alias to register.
        alias: String,
    },
    /// Remove an alias mapping (the alias-entity row, if any, is untouched).
    Remove {
        /// Canonical entity name.
        entity: String,
        /// Alias to remove.
        alias: String,
    },
    /// List the aliases registered for an entity.
    List {
        /// Entity or alias name.
        entity: String,
        #[command(flatten)]
        format: FormatArg,
    },
}

/// `relationship` subcommands.
#[derive(Debug, Subcommand)]
pub enum RelationshipAction {
    /// Insert or update a relationship.
    Add {
        /// Source entity name.
        source: String,
        /// Target entity name.
        target: String,
        /// Relationship strength.
        #[arg(long, default_value_t = 0.0)]
        strength: f64,
        /// Directed (source -> target) rather than undirected.
        #[arg(long)]
        directed: bool,
    },
    /// Print a single relationship, resolving aliases on both endpoints.
    Get {
        /// Source entity name.
        source: String,
        /// Target entity name.
        target: String,
        /// Directed (source -> target) rather than undirected.
        #[arg(long)]
        directed: bool,
        #[command(flatten)]
        format: FormatArg,
    },
    /// List relationships touching an entity.
    List {
        /// Entity or alias name.
        entity: String,
        /// Minimum strength to include.
        #[arg(long)]
        min_strength: Option<f64>,
        /// Restrict to directed or undirected edges.
        #[arg(long)]
        directed: Option<bool>,
        #[command(flatten)]
        format: FormatArg,
    },
    /// Delete relationships between two entities.
    Remove {
        /// Source entity name.
        source: String,
        /// Target entity name.
        target: String,
        /// Restrict to directed or undirected edges; omit to match both.
        #[arg(long)]
        directed: Option<bool>,
        /// Also delete claims attached to the matched relationships.
        #[arg(long, default_value_t = true)]
        cascade: bool,
    },
}

/// `claim` subcommands.
#[derive(Debug, Subcommand)]
pub enum ClaimAction {
    /// Add a claim about an entity.
    Add {
        /// Claim text.
        content: String,
        /// Entity the claim is about.
        #[arg(long, conflicts_with_all = ["rel_source", "rel_target"])]
        entity: Option<String>,
        /// Source relationship endpoint (requires `--rel-target`).
        #[arg(long, requires = "rel_target")]
        rel_source: Option<String>,
        /// Target relationship endpoint (requires `--rel-source`).
        #[arg(long, requires = "rel_source")]
        rel_target: Option<String>,
        /// Relationship strength, if the claim is about a relationship.
        #[arg(long, default_value_t = 0.0)]
        rel_strength: f64,
        /// Relationship directedness, if the claim is about a relationship.
        #[arg(long)]
        rel_directed: bool,
        /// Claim source/attribution.
        #[arg(long)]
        source: Option<String>,
    },
    /// List claims about an entity.
    List {
        /// Entity or alias name.
        entity: String,
        #[command(flatten)]
        format: FormatArg,
    },
    /// Delete claims about an entity.
    Remove {
        /// Entity or alias name.
        entity: String,
    },
}

/// `dump` subcommands.
#[derive(Debug, Subcommand)]
pub enum DumpAction {
    /// Dump every relationship.
    Relationships,
    /// Dump every claim.
    Claims,
}

/// Shared `--format table|json` argument.
#[derive(Debug, Args)]
pub struct FormatArg {
    /// Output format.
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Runs the parsed CLI against a freshly opened [`GraphIndex`].
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the requested
/// operation fails.
pub fn run(cli: Cli) -> Result<()> {
    let config = match cli.db_path {
        Some(path) => GraphConfig::at(path),
        None => GraphConfig::from_env(),
    };
    let index = GraphIndex::open(config)?;
    dispatch(&index, cli.command)
}

fn dispatch(index: &GraphIndex, command: Command) -> Result<()> {
    match command {
        Command::Entity { action } => dispatch_entity(index, action),
        Command::Alias { action } => dispatch_alias(index, action),
        Command::Relationship { action } => dispatch_relationship(index, action),
        Command::Claim { action } => dispatch_claim(index, action),
        Command::Merge { canonical, alias } => index.merge_alias(&canonical, &alias),
        Command::MergeAll {
            canonical,
            skip_on_conflict,
        } => {
            let strategy = if skip_on_conflict {
                MergeStrategy::SkipOnConflict
            } else {
                MergeStrategy::ErrorOnConflict
            };
            let outcome = index.merge_all_aliases(&canonical, strategy)?;
            output::print_merge_outcome(&outcome);
            Ok(())
        }
        Command::Dump { what } => dispatch_dump(index, what),
        Command::Drop { yes } => dispatch_drop(index, yes),
    }
}

fn dispatch_entity(index: &GraphIndex, action: EntityAction) -> Result<()> {
    match action {
        EntityAction::Add { name, entity_type } => {
            index.upsert_entity(&name, entity_type.as_deref())?;
            Ok(())
        }
        EntityAction::Get { name, format } => {
            let record = index.get_entity(&name)?;
            output::print_entity(record.as_ref(), format.format);
            Ok(())
        }
        EntityAction::List { format } => {
            let names = index.list_all_entities()?;
            output::print_entity_names(&names, format.format);
            Ok(())
        }
        EntityAction::Exists { name } => {
            let exists = index.entity_exists(&name)?;
            println!("{exists}");
            Ok(())
        }
        EntityAction::Remove { name, cascade } => index.delete_entity(&name, cascade),
    }
}

fn dispatch_alias(index: &GraphIndex, action: AliasAction) -> Result<()> {
    match action {
        AliasAction::Add { entity, alias } => {
            index.upsert_alias(&entity, &alias)?;
            Ok(())
        }
        AliasAction::Remove { entity, alias } => index.delete_alias(&entity, &alias),
        AliasAction::List { entity, format } => {
            let aliases = index.list_all_aliases(&entity)?;
            output::print_string_list(&aliases, format.format);
            Ok(())
        }
    }
}

fn dispatch_relationship(index: &GraphIndex, action: RelationshipAction) -> Result<()> {
    match action {
        RelationshipAction::Add {
            source,
            target,
            strength,
            directed,
        } => {
            index.upsert_relationship(&source, &target, strength, directed)?;
            Ok(())
        }
        RelationshipAction::Get {
            source,
            target,
            directed,
            format,
        } => {
            let relationship = index.get_relationship(&source, &target, directed)?;
            output::print_relationships(std::slice::from_ref(&relationship), format.format);
            Ok(())
        }
        RelationshipAction::List {
            entity,
            min_strength,
            directed,
            format,
        } => {
            let relationships = index.load_relationships(&entity, min_strength, directed)?;
            output::print_relationships(&relationships, format.format);
            Ok(())
        }
        RelationshipAction::Remove {
            source,
            target,
            directed,
            cascade,
        } => index.delete_relationship(&source, &target, directed, cascade),
    }
}

fn dispatch_claim(index: &GraphIndex, action: ClaimAction) -> Result<()> {
    match action {
        ClaimAction::Add {
            content,
            entity,
            rel_source,
            rel_target,
            rel_strength,
            rel_directed,
            source,
        } => {
            let owner = if let Some(entity) = entity.as_deref() {
                ClaimOwner::Entity(entity)
            } else if let (Some(src), Some(tgt)) = (rel_source.as_deref(), rel_target.as_deref()) {
                ClaimOwner::Relationship {
                    source: src,
                    target: tgt,
                    strength: rel_strength,
                    directed: rel_directed,
                }
            } else {
                return Err(crate::error::Error::InvalidArgument(
                    "claim add requires --entity or --rel-source/--rel-target".to_string(),
                ));
            };
            index.upsert_claim(&content, source.as_deref(), owner, None)?;
            Ok(())
        }
        ClaimAction::List { entity, format } => {
            let claims = index.load_entity_claims(&entity)?;
            output::print_claims(&claims, format.format);
            Ok(())
        }
        ClaimAction::Remove { entity } => {
            index.delete_claim(DeleteClaimFilter::ByEntity(&entity))
        }
    }
}

fn dispatch_dump(index: &GraphIndex, what: DumpAction) -> Result<()> {
    match what {
        DumpAction::Relationships => {
            let relationships = index.dump_all_relationships()?;
            output::print_relationships(&relationships, OutputFormat::Json);
            Ok(())
        }
        DumpAction::Claims => {
            let claims = index.dump_all_claims()?;
            output::print_claims(&claims, OutputFormat::Json);
            Ok(())
        }
    }
}

fn dispatch_drop(index: &GraphIndex, yes: bool) -> Result<()> {
    if !yes {
        eprintln!("This deletes every entity, alias, relationship, and claim.");
        eprint!("Type 'yes' to continue: ");
        use std::io::Write as _;
        std::io::stderr().flush().ok();
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        if input.trim() != "yes" {
            eprintln!("aborted");
            return Ok(());
        }
    }
    index.drop_all()
}
