use crate::utils::error::{GatewayError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// On-disk configuration; every section is optional.
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8082"
///
/// [movie_info]
/// url = "http://localhost:8080/v1/movieinfos"
/// timeout_ms = 5000
///
/// [movie_info.retry]
/// max_attempts = 4
/// base_delay_ms = 1000
/// jitter_factor = 0.1
///
/// [broadcast]
/// replay_capacity = 500
/// live_buffer = 1024
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerConfig>,
    pub movie_info: Option<DownstreamConfig>,
    pub reviews: Option<DownstreamConfig>,
    pub broadcast: Option<BroadcastSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub jitter_factor: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastSection {
    pub replay_capacity: Option<usize>,
    pub live_buffer: Option<usize>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GatewayError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GatewayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MOVIE_INFO_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}
