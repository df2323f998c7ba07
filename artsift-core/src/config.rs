//! Pipeline configuration.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment. CLI flags override individual fields on the loaded value.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Met collection endpoint; one object lookup per identifier.
pub const DEFAULT_MET_BASE_URL: &str =
    "https://collectionapi.metmuseum.org/public/collection/v1/objects";

/// Tuning knobs for one pipeline invocation.
///
/// Everything the original kept as module-level constants is an explicit
/// parameter here so callers and tests can override deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of verification requests in flight at once.
    pub max_in_flight: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Base endpoint for Met object lookups.
    pub met_base_url: String,
    /// Emit a progress log line every this many completions.
    pub progress_log_every: usize,
    /// User-Agent header sent with verification requests.
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 500,
            request_timeout_secs: 30,
            met_base_url: DEFAULT_MET_BASE_URL.to_string(),
            progress_log_every: 50,
            user_agent: concat!("artsift/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PipelineConfig {
    /// Rejects values the scheduler cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Load configuration: defaults -> optional TOML file -> `ARTSIFT_`-prefixed
/// environment variables.
pub fn load_config(config_file: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("ARTSIFT_"));

    let config: PipelineConfig = figment
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
