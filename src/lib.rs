pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::Settings;

pub use crate::core::broadcast::{BroadcastConfig, ReplayChannel};
pub use crate::core::orchestrator::{AggregateResult, Aggregator};
pub use crate::core::retry::RetrySpec;
pub use domain::model::{Movie, MovieInfo, Review};
pub use utils::error::{ErrorKind, GatewayError, RemoteError, Result};
