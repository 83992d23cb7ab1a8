//! # HyperHelix CLI Module
//!
//! This module implements the CLI interface for HyperHelix.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show graph metrics
//! - `add-node` / `remove-node` - Node CRUD
//! - `add-edge` / `remove-edge` - Edge CRUD
//! - `walk` - Spiral walk from a node
//! - `path` - Weighted shortest path
//! - `find` - Nodes carrying a tag
//! - `summary` - One-line summary
//! - `export` - JSON dump
//! - `snapshot` / `restore` - Binary snapshot of the whole graph

mod commands;

use crate::config::{HelixConfig, Overrides};
use clap::{Parser, Subcommand};
use helix_core::HelixError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// HyperHelix - labeled graph engine
///
/// Nodes carry a JSON payload and tags; edges are weighted and undirected.
/// State lives in a redb database.
#[derive(Parser, Debug)]
#[command(name = "helix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./helix.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the redb database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show graph metrics
    Status,

    /// Add a node, or overwrite the node with the same id
    AddNode {
        id: String,

        /// JSON payload
        #[arg(short, long)]
        data: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        layer: i64,

        #[arg(short, long)]
        strand: Option<String>,
    },

    /// Remove a node and every edge touching it
    RemoveNode { id: String },

    /// Connect two nodes
    AddEdge {
        a: String,
        b: String,

        #[arg(short, long, default_value = "1.0")]
        weight: f64,
    },

    /// Disconnect two nodes
    RemoveEdge { a: String, b: String },

    /// Breadth-first spiral walk
    Walk {
        id: String,

        /// Walk depth (defaults to graph.walk_depth from the config)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Weighted shortest path
    Path { a: String, b: String },

    /// Find nodes by tag
    Find { tag: String },

    /// Print a one-line summary
    Summary {
        /// Number of sample ids
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Export the graph as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a binary snapshot of the graph
    Snapshot {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Load a binary snapshot into the database
    Restore {
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HelixError> {
    let (host, port) = match &cli.command {
        Some(Commands::Server { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };

    let config = HelixConfig::load(cli.config.as_deref())?.apply_overrides(Overrides {
        database: cli.database,
        host,
        port,
    });
    config.validate()?;

    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config).await,
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::AddNode {
            id,
            data,
            tags,
            layer,
            strand,
        }) => cmd_add_node(
            &config,
            json_mode,
            NodeArgs {
                id,
                data,
                tags,
                layer,
                strand,
            },
        ),
        Some(Commands::RemoveNode { id }) => cmd_remove_node(&config, json_mode, &id),
        Some(Commands::AddEdge { a, b, weight }) => {
            cmd_add_edge(&config, json_mode, &a, &b, weight)
        }
        Some(Commands::RemoveEdge { a, b }) => cmd_remove_edge(&config, json_mode, &a, &b),
        Some(Commands::Walk { id, depth }) => cmd_walk(&config, json_mode, &id, depth),
        Some(Commands::Path { a, b }) => cmd_path(&config, json_mode, &a, &b),
        Some(Commands::Find { tag }) => cmd_find(&config, json_mode, &tag),
        Some(Commands::Summary { limit }) => cmd_summary(&config, json_mode, limit),
        Some(Commands::Export { output }) => cmd_export(&config, output.as_deref()),
        Some(Commands::Snapshot { output }) => cmd_snapshot(&config, &output),
        Some(Commands::Restore { input }) => cmd_restore(&config, json_mode, &input),
    }
}
