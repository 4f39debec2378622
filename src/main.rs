use anyhow::Context;
use clap::Parser;
use movies_gateway::adapters::http;
use movies_gateway::app::movies_service::MoviesService;
use movies_gateway::domain::ports::ConfigProvider;
use movies_gateway::utils::logger;
use movies_gateway::{BroadcastConfig, CliConfig};

const DEFAULT_BIND: &str = "0.0.0.0:8082";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting movies gateway");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let settings = match cli.resolve(DEFAULT_BIND, BroadcastConfig::default()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        movie_info_url = settings.movie_info_url(),
        reviews_url = settings.reviews_url(),
        max_attempts = settings.movie_info.retry.max_attempts,
        "Downstream services configured"
    );

    let service = MoviesService::new(
        settings.movie_info_client().context("building movie info client")?,
        settings.reviews_client().context("building reviews client")?,
    );
    let router = http::with_common_routes(http::movies::router(service));

    http::serve(router, settings.bind_address())
        .await
        .with_context(|| format!("serving on {}", settings.bind_address()))?;

    tracing::info!("Movies gateway stopped");
    Ok(())
}
