//! Roll ranking API server

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use rollrank::{EngineLoader, FileStatsSource, HttpStatsSource, StandardToEnhancedMap};
use rollrank_api::{router, AppState, StatsOrigin, ASSETS_ROUTE};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(name = "rollrank-api")]
#[command(about = "API server for weapon roll ranking queries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3040")]
        port: u16,

        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,

        /// Fetch the statistics document from this URL
        #[arg(long, env = "ROLLRANK_STATS_URL", conflicts_with = "stats_file")]
        stats_url: Option<String>,

        /// Read the statistics document from this file
        #[arg(long, env = "ROLLRANK_STATS_FILE")]
        stats_file: Option<PathBuf>,

        /// Standard -> enhanced perk mapping file
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Directory served under /backend/light (statistics document and its .br)
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            bind,
            stats_url,
            stats_file,
            mapping,
            assets,
        } => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "rollrank=info,rollrank_api=info,tower_http=debug".into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let source = match (stats_url, stats_file) {
                (Some(url), _) => StatsOrigin::Http(HttpStatsSource::new(url)),
                (None, Some(path)) => StatsOrigin::File(FileStatsSource::new(path)),
                (None, None) => bail!("One of --stats-url or --stats-file is required"),
            };

            let mapping = match mapping {
                Some(path) => StandardToEnhancedMap::load(&path)
                    .with_context(|| format!("Failed to load mapping from {}", path.display()))?,
                None => {
                    tracing::warn!("No mapping file given, enhanced perks will not fall back");
                    StandardToEnhancedMap::new()
                }
            };
            tracing::info!("Loaded {} perk mappings", mapping.len());

            let state = Arc::new(AppState {
                loader: EngineLoader::new(source, mapping),
            });

            // Start loading now; requests arriving meanwhile wait on the same load
            let warm = state.clone();
            tokio::spawn(async move {
                warm.loader.get().await;
            });

            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);

            let app = router(state, assets.as_deref())
                .layer(cors)
                .layer(TraceLayer::new_for_http());

            let bind_addr = format!("{}:{}", bind, port);
            tracing::info!("Starting server on {}", bind_addr);
            if let Some(dir) = &assets {
                tracing::info!("Serving {} at {}", dir.display(), ASSETS_ROUTE);
            }

            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
