use anyhow::Context;
use clap::Parser;
use movies_gateway::adapters::{http, store::InMemoryRepository};
use movies_gateway::app::movie_info_service::MovieInfoService;
use movies_gateway::utils::logger;
use movies_gateway::{BroadcastConfig, CliConfig, MovieInfo, ReplayChannel};
use std::sync::Arc;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    logger::init_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting movie info service");

    let settings = match cli.resolve(DEFAULT_BIND, BroadcastConfig::replay_all()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let service = MovieInfoService::new(
        Arc::new(InMemoryRepository::<MovieInfo>::new()),
        ReplayChannel::new(settings.broadcast),
    );
    let router = http::with_common_routes(http::movie_info::router(service));

    http::serve(router, &settings.bind)
        .await
        .with_context(|| format!("serving on {}", settings.bind))
}
