//! Inbound HTTP surface of the three services.

pub mod error;
pub mod movie_info;
pub mod movies;
pub mod ndjson;
pub mod reviews;

use crate::utils::error::Result;
use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Add the liveness route and request tracing to a service router.
pub fn with_common_routes(router: Router) -> Router {
    router
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}

/// Bind `address` and serve until Ctrl-C.
pub async fn serve(router: Router, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        })
        .await?;
    Ok(())
}
