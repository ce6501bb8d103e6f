//! CLI argument definitions for rollrank
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod query;

pub use core::{Cli, Commands};
pub use query::QueryCommand;
