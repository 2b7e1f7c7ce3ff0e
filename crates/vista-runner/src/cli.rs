//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interpret the demo candidate screens against a JSON fixture.
#[derive(Debug, Clone, Parser)]
#[command(name = "vista", version, about = "Interpret declarative screens in the terminal", long_about = None)]
pub struct Cli {
    /// Settings file (TOML). Defaults to `<config_dir>/vista/settings.toml`.
    #[arg(long, value_name = "PATH", global = true)]
    pub settings: Option<PathBuf>,

    /// JSON array of candidate records. Defaults to a built-in dataset.
    #[arg(long, value_name = "PATH", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print one page of the candidate list.
    List {
        /// Status filter ("all" for every status).
        #[arg(long)]
        status: Option<String>,

        /// Free-text search over name, email and title.
        #[arg(long)]
        search: Option<String>,

        /// Only candidates marked hot.
        #[arg(long)]
        hot: bool,

        /// Sort column.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long)]
        desc: bool,

        /// Zero-based page.
        #[arg(long, default_value_t = 0)]
        page: usize,
    },

    /// Print a candidate's detail screen.
    Show {
        id: String,

        /// Section to open.
        #[arg(long)]
        section: Option<String>,
    },

    /// Run a quick action on a candidate.
    Action { action: String, id: String },

    /// Print the pipeline board, optionally dragging a card to a column.
    Board {
        /// Candidate to move.
        #[arg(long = "move", value_name = "ID", requires = "to")]
        move_id: Option<String>,

        /// Target column.
        #[arg(long, value_name = "COLUMN")]
        to: Option<String>,
    },
}
