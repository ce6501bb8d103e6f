//! Command handlers for rollrank CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod generate;
pub mod query;
