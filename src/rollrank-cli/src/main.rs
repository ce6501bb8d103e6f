mod cli;
mod commands;
mod config;
mod dispatch;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollrank=info,rollrank_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Generate {
            no_fetch,
            input,
            mapping_output,
            reduced_output,
            policy,
        } => {
            dispatch::dispatch_generate(
                &config,
                no_fetch,
                input,
                mapping_output,
                reduced_output,
                policy,
            )?;
        }

        Commands::Mapping {
            input,
            output,
            policy,
        } => {
            commands::generate::mapping(
                &input.unwrap_or_else(|| config.input()),
                &output.unwrap_or_else(|| config.mapping_output()),
                policy.unwrap_or_else(|| config.policy()),
            )?;
        }

        Commands::Reduce { input, output } => {
            commands::generate::reduce(
                &input.unwrap_or_else(|| config.input()),
                &output.unwrap_or_else(|| config.reduced_output()),
            )?;
        }

        Commands::Compress { input } => {
            commands::generate::compress(&input.unwrap_or_else(|| config.input()))?;
        }

        Commands::Query {
            stats,
            mapping,
            command,
        } => {
            dispatch::dispatch_query(&config, stats, mapping, command)?;
        }

        Commands::Configure {
            input,
            mapping_output,
            reduced_output,
            fetch_command,
            policy,
            show,
        } => {
            let update = commands::configure::ConfigUpdate {
                input,
                mapping_output,
                reduced_output,
                fetch_command,
                policy,
            };
            commands::configure::handle(update, show)?;
        }
    }

    Ok(())
}
