use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::core::broadcast::BroadcastConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

/// Command line flags shared by the three service binaries.
#[derive(Debug, Clone, Parser)]
pub struct CliConfig {
    #[arg(long, short, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Socket address to listen on")]
    pub bind: Option<String>,

    #[arg(long, help = "Base URL of the movie info service")]
    pub movie_info_url: Option<String>,

    #[arg(long, help = "Base URL of the reviews service")]
    pub reviews_url: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// Resolve defaults, then the config file, then flags, and validate.
    pub fn resolve(&self, default_bind: &str, broadcast: BroadcastConfig) -> Result<Settings> {
        let mut settings = Settings::defaults(default_bind, broadcast);

        if let Some(path) = &self.config {
            tracing::debug!("Loading configuration from {}", path.display());
            settings = settings.apply_toml(&TomlConfig::from_file(path)?);
        }
        if let Some(bind) = &self.bind {
            settings.bind = bind.clone();
        }
        if let Some(url) = &self.movie_info_url {
            settings.movie_info.url = url.clone();
        }
        if let Some(url) = &self.reviews_url {
            settings.reviews.url = url.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}
