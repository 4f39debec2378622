#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::clients::{MovieInfoClient, ReviewsClient};
use crate::core::broadcast::BroadcastConfig;
use crate::core::client::{DownstreamClient, DEFAULT_TIMEOUT};
use crate::core::retry::{RetrySpec, MAX_JITTER_FACTOR};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_bind_address, validate_positive_number, validate_range, validate_url, Validate,
};
use std::time::Duration;
use toml_config::{DownstreamConfig, RetryConfig, TomlConfig};

pub const DEFAULT_MOVIE_INFO_URL: &str = "http://localhost:8080/v1/movieinfos";
pub const DEFAULT_REVIEWS_URL: &str = "http://localhost:8081/v1/reviews";

/// Upper bound for `retry.base_delay_ms`.
pub const MAX_BASE_DELAY_MS: u128 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamSettings {
    pub url: String,
    pub timeout: Duration,
    pub retry: RetrySpec,
}

impl DownstreamSettings {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetrySpec::default(),
        }
    }

    fn apply(&mut self, section: &DownstreamConfig) {
        if let Some(url) = &section.url {
            self.url = url.clone();
        }
        if let Some(timeout_ms) = section.timeout_ms {
            self.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(retry) = &section.retry {
            self.retry = merge_retry(&self.retry, retry);
        }
    }

    fn validate_as(&self, section: &str) -> Result<()> {
        validate_url(&format!("{}.url", section), &self.url)?;
        validate_positive_number(
            &format!("{}.timeout_ms", section),
            self.timeout.as_millis() as usize,
            1,
        )?;
        validate_positive_number(
            &format!("{}.retry.max_attempts", section),
            self.retry.max_attempts as usize,
            1,
        )?;
        validate_range(
            &format!("{}.retry.base_delay_ms", section),
            self.retry.base_delay.as_millis(),
            0,
            MAX_BASE_DELAY_MS,
        )?;
        validate_range(
            &format!("{}.retry.jitter_factor", section),
            self.retry.jitter_factor,
            0.0,
            MAX_JITTER_FACTOR,
        )
    }

    pub fn client(&self, label: &str) -> Result<DownstreamClient> {
        DownstreamClient::new(label, &self.url, self.retry.clone(), self.timeout)
    }
}

fn merge_retry(base: &RetrySpec, section: &RetryConfig) -> RetrySpec {
    let mut builder = RetrySpec::builder()
        .max_attempts(base.max_attempts)
        .base_delay(base.base_delay)
        .jitter_factor(base.jitter_factor)
        .retryable_kinds(base.retryable_kinds.iter().copied());
    if let Some(max_attempts) = section.max_attempts {
        builder = builder.max_attempts(max_attempts);
    }
    if let Some(base_delay_ms) = section.base_delay_ms {
        builder = builder.base_delay(Duration::from_millis(base_delay_ms));
    }
    if let Some(jitter_factor) = section.jitter_factor {
        builder = builder.jitter_factor(jitter_factor);
    }
    builder.build()
}

/// Fully resolved runtime settings of one service process.
///
/// Built from per-binary defaults, then the TOML file, then command line
/// overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: String,
    pub movie_info: DownstreamSettings,
    pub reviews: DownstreamSettings,
    pub broadcast: BroadcastConfig,
}

impl Settings {
    pub fn defaults(bind: &str, broadcast: BroadcastConfig) -> Self {
        Self {
            bind: bind.to_string(),
            movie_info: DownstreamSettings::new(DEFAULT_MOVIE_INFO_URL),
            reviews: DownstreamSettings::new(DEFAULT_REVIEWS_URL),
            broadcast,
        }
    }

    pub fn apply_toml(mut self, config: &TomlConfig) -> Self {
        if let Some(bind) = config.server.as_ref().and_then(|s| s.bind.clone()) {
            self.bind = bind;
        }
        if let Some(section) = &config.movie_info {
            self.movie_info.apply(section);
        }
        if let Some(section) = &config.reviews {
            self.reviews.apply(section);
        }
        if let Some(section) = &config.broadcast {
            if section.replay_capacity.is_some() {
                self.broadcast.replay_capacity = section.replay_capacity;
            }
            if let Some(live_buffer) = section.live_buffer {
                self.broadcast.live_buffer = live_buffer;
            }
        }
        self
    }

    pub fn movie_info_client(&self) -> Result<MovieInfoClient> {
        Ok(MovieInfoClient::new(self.movie_info.client("movie info")?))
    }

    pub fn reviews_client(&self) -> Result<ReviewsClient> {
        Ok(ReviewsClient::new(self.reviews.client("reviews")?))
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_bind_address("server.bind", &self.bind)?;
        self.movie_info.validate_as("movie_info")?;
        self.reviews.validate_as("reviews")?;
        validate_positive_number("broadcast.live_buffer", self.broadcast.live_buffer, 1)
    }
}

impl ConfigProvider for Settings {
    fn bind_address(&self) -> &str {
        &self.bind
    }

    fn movie_info_url(&self) -> &str {
        &self.movie_info.url
    }

    fn reviews_url(&self) -> &str {
        &self.reviews.url
    }
}
