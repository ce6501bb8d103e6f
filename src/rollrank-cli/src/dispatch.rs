//! Command dispatch functions
//!
//! Resolves flags against the loaded config before calling handlers.

use anyhow::Result;
use rollrank::MappingPolicy;
use std::path::PathBuf;

use crate::cli::QueryCommand;
use crate::commands;
use crate::commands::generate::GenerateOptions;
use crate::config::Config;

/// Dispatch the full pipeline
pub fn dispatch_generate(
    config: &Config,
    no_fetch: bool,
    input: Option<PathBuf>,
    mapping_output: Option<PathBuf>,
    reduced_output: Option<PathBuf>,
    policy: Option<MappingPolicy>,
) -> Result<()> {
    let options = GenerateOptions {
        input: input.unwrap_or_else(|| config.input()),
        mapping_output: mapping_output.unwrap_or_else(|| config.mapping_output()),
        reduced_output: reduced_output.unwrap_or_else(|| config.reduced_output()),
        policy: policy.unwrap_or_else(|| config.policy()),
        fetch_command: (!no_fetch).then(|| config.fetch_command()),
    };

    commands::generate::generate(&options)?;
    Ok(())
}

/// Dispatch a query, defaulting to the configured generator outputs
pub fn dispatch_query(
    config: &Config,
    stats: Option<PathBuf>,
    mapping: Option<PathBuf>,
    command: QueryCommand,
) -> Result<()> {
    let stats = stats.unwrap_or_else(|| config.reduced_output());
    let mapping = mapping.or_else(|| {
        let path = config.mapping_output();
        path.exists().then_some(path)
    });

    let engine = commands::query::load_engine(&stats, mapping.as_deref())?;
    commands::query::handle(&engine, command)
}
