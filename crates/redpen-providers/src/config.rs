//! Configuration loading and service construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use redpen_core::service::{AssessmentService, ServiceConfig};
use redpen_core::traits::AssessmentSource;

use crate::remote::RemoteSource;

/// Connection settings for a remote, OpenAI-compatible source.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_timeout_secs() -> u64 {
    22
}
fn default_temperature() -> f64 {
    0.2
}
fn default_max_tokens() -> u32 {
    2200
}

/// Top-level redpen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedpenConfig {
    /// Remote source; remote calls are made only when it carries an API key.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    /// Retries after a failed remote attempt.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent evaluations.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Root of the snapshot store.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    #[serde(default = "default_subject")]
    pub default_subject: String,
    #[serde(default = "default_candidate_id")]
    pub candidate_id: String,
}

fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    350
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./redpen-results")
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("./redpen-store")
}
fn default_subject() -> String {
    "Computer Science".to_string()
}
fn default_candidate_id() -> String {
    redpen_core::engine::DEFAULT_CANDIDATE_ID.to_string()
}

impl Default for RedpenConfig {
    fn default() -> Self {
        Self {
            remote: None,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            store_dir: default_store_dir(),
            default_subject: default_subject(),
            candidate_id: default_candidate_id(),
        }
    }
}

impl RedpenConfig {
    /// Retry and concurrency settings for the assessment service.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            parallelism: self.parallelism,
        }
    }

    /// The remote settings, if remote calls are enabled.
    pub fn active_remote(&self) -> Option<&RemoteConfig> {
        self.remote
            .as_ref()
            .filter(|remote| !remote.api_key.trim().is_empty())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_remote_config(remote: &RemoteConfig) -> RemoteConfig {
    RemoteConfig {
        api_key: resolve_env_vars(&remote.api_key),
        base_url: resolve_env_vars(&remote.base_url),
        model: resolve_env_vars(&remote.model),
        ..remote.clone()
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `redpen.toml` in the current directory
/// 2. `~/.config/redpen/config.toml`
///
/// Environment variable overrides: `REDPEN_API_KEY`, `REDPEN_BASE_URL`, `REDPEN_MODEL`.
pub fn load_config() -> Result<RedpenConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RedpenConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("redpen.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RedpenConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

/// Parse a TOML configuration document.
pub fn parse_config(content: &str) -> Result<RedpenConfig> {
    Ok(toml::from_str::<RedpenConfig>(content)?)
}

fn apply_env_overrides(mut config: RedpenConfig) -> RedpenConfig {
    let overrides = [
        std::env::var("REDPEN_API_KEY").ok(),
        std::env::var("REDPEN_BASE_URL").ok(),
        std::env::var("REDPEN_MODEL").ok(),
    ];
    if overrides.iter().any(Option::is_some) {
        let remote = config.remote.get_or_insert_with(RemoteConfig::default);
        let [api_key, base_url, model] = overrides;
        if let Some(key) = api_key {
            remote.api_key = key;
        }
        if let Some(url) = base_url {
            remote.base_url = url;
        }
        if let Some(model) = model {
            remote.model = model;
        }
    }

    config.remote = config.remote.as_ref().map(resolve_remote_config);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("redpen"))
}

/// Create the remote source, if the configuration enables one.
pub fn create_remote_source(config: &RedpenConfig) -> Result<Option<Arc<dyn AssessmentSource>>> {
    match config.active_remote() {
        Some(remote) => {
            let source = RemoteSource::new(remote)?;
            tracing::info!(model = %remote.model, base_url = %remote.base_url, "remote source enabled");
            Ok(Some(Arc::new(source)))
        }
        None => {
            tracing::debug!("no API key configured, using deterministic source only");
            Ok(None)
        }
    }
}

/// Build the assessment service described by `config`.
pub fn build_service(config: &RedpenConfig) -> Result<AssessmentService> {
    Ok(AssessmentService::new(
        create_remote_source(config)?,
        config.service_config(),
    ))
}

/// A commented starter configuration file.
pub const STARTER_CONFIG: &str = r#"# redpen configuration

# Retries after a failed remote attempt, and the first backoff delay.
max_retries = 3
retry_delay_ms = 350
parallelism = 4

output_dir = "./redpen-results"
store_dir = "./redpen-store"
default_subject = "Computer Science"
candidate_id = "candidate-001"

# Remote generation is used only when api_key resolves to a non-empty value.
# Without it every command runs on the deterministic engine.
[remote]
api_key = "${REDPEN_API_KEY}"
base_url = "https://api.openai.com"
model = "gpt-4.1-mini"
timeout_secs = 22
temperature = 0.2
max_tokens = 2200
"#;
