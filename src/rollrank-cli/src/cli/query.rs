//! CLI definitions for ranking queries

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum QueryCommand {
    /// Rank of a perk on a weapon (enhanced perks fall back to their standard rank)
    Perk {
        /// Weapon item hash
        weapon: u32,

        /// Perk item hash
        perk: u32,
    },

    /// Rank of a masterwork stat perk on a weapon
    Mw {
        /// Weapon item hash
        weapon: u32,

        /// Masterwork perk hash
        perk: u32,
    },

    /// Rank of a trait perk pair (order matters: trait column 1, then 2)
    Combo {
        /// Weapon item hash
        weapon: u32,

        /// Perk in the first trait column
        perk_a: u32,

        /// Perk in the second trait column
        perk_b: u32,
    },

    /// Community review scores for a weapon
    Review {
        /// Weapon item hash
        weapon: u32,
    },

    /// Every ranking for a roll
    Weapon {
        /// Weapon item hash
        weapon: u32,

        /// Perk hashes in column order (the last two are the trait pair)
        #[arg(long, value_delimiter = ',')]
        perks: Vec<u32>,

        /// Masterwork perk hash
        #[arg(long)]
        mw: Option<u32>,
    },

    /// Most popular visible trait combos
    TopCombos {
        /// Weapon item hash
        weapon: u32,

        /// Number of combos to list
        #[arg(short, long, default_value_t = rollrank::engine::DEFAULT_TOP_COMBOS)]
        limit: usize,
    },

    /// Best ranked combo among candidate trait perks
    Best {
        /// Weapon item hash
        weapon: u32,

        /// Candidate perks for the first trait column
        #[arg(long, value_delimiter = ',', required = true)]
        a: Vec<u32>,

        /// Candidate perks for the second trait column
        #[arg(long, value_delimiter = ',', required = true)]
        b: Vec<u32>,
    },

    /// Appraise a roll described by a JSON file and suggest better trait perks
    Appraise {
        /// Roll JSON: {"itemHash": .., "columns": [{"plugged": .., "options": [..]}], "masterwork": ..}
        roll: PathBuf,
    },

    /// Check a roll against search filters (e.g. "comborank:<=2" "pvescore:>=4")
    Filter {
        /// Roll JSON file
        roll: PathBuf,

        /// Filters, all of which must match
        #[arg(required = true, num_args = 1..)]
        filters: Vec<String>,
    },
}
