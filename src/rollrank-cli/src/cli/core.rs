//! Core CLI definitions

use clap::{Parser, Subcommand};
use rollrank::MappingPolicy;
use std::path::PathBuf;

use super::query::QueryCommand;

#[derive(Parser)]
#[command(name = "rollrank")]
#[command(about = "Weapon roll ranking data pipeline and queries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: fetch, mapping, reduce, compress
    #[command(visible_alias = "g")]
    Generate {
        /// Skip the upstream fetch command and use the existing input file
        #[arg(long)]
        no_fetch: bool,

        /// Raw roll appraiser dataset (uses configured default if not provided)
        #[arg(short, long, env = "ROLLRANK_INPUT")]
        input: Option<PathBuf>,

        /// Output path for the standard -> enhanced mapping
        #[arg(long)]
        mapping_output: Option<PathBuf>,

        /// Output path for the reduced statistics document
        #[arg(long)]
        reduced_output: Option<PathBuf>,

        /// Which hash of a two-hash perk is the standard one
        #[arg(long)]
        policy: Option<MappingPolicy>,
    },

    /// Generate only the standard -> enhanced perk mapping
    #[command(visible_alias = "m")]
    Mapping {
        /// Raw roll appraiser dataset
        #[arg(short, long, env = "ROLLRANK_INPUT")]
        input: Option<PathBuf>,

        /// Output path (uses configured default if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Which hash of a two-hash perk is the standard one
        #[arg(long)]
        policy: Option<MappingPolicy>,
    },

    /// Cut the raw dataset down to the runtime statistics tables
    #[command(visible_alias = "r")]
    Reduce {
        /// Raw roll appraiser dataset
        #[arg(short, long, env = "ROLLRANK_INPUT")]
        input: Option<PathBuf>,

        /// Output path (uses configured default if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compress the raw dataset next to itself
    Compress {
        /// Raw roll appraiser dataset
        #[arg(short, long, env = "ROLLRANK_INPUT")]
        input: Option<PathBuf>,
    },

    /// Query rankings from a statistics document
    #[command(visible_alias = "q")]
    Query {
        /// Statistics document, raw or reduced (defaults to the configured reduced output)
        #[arg(long, env = "ROLLRANK_STATS_FILE")]
        stats: Option<PathBuf>,

        /// Mapping file (defaults to the configured mapping output when present)
        #[arg(long)]
        mapping: Option<PathBuf>,

        #[command(subcommand)]
        command: QueryCommand,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default raw dataset path
        #[arg(long)]
        input: Option<PathBuf>,

        /// Set default mapping output path
        #[arg(long)]
        mapping_output: Option<PathBuf>,

        /// Set default reduced output path
        #[arg(long)]
        reduced_output: Option<PathBuf>,

        /// Set the fetch command (program followed by its arguments)
        #[arg(long, num_args = 1.., allow_hyphen_values = true)]
        fetch_command: Option<Vec<String>>,

        /// Set the default mapping policy
        #[arg(long)]
        policy: Option<MappingPolicy>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
