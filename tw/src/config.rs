//! TaskWeave configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Providers understood by [`crate::llm::create_client`]
pub const SUPPORTED_PROVIDERS: &[&str] = &["ollama", "openai"];

/// Main TaskWeave configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion backend configuration
    pub llm: LlmConfig,

    /// Agent behaviour (chain length, parallelism, verbosity)
    pub agent: AgentConfig,

    /// Web search tool configuration
    pub search: SearchConfig,

    /// Log level used when the CLI does not override it
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        debug!("Config::validate: called");
        if !SUPPORTED_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(eyre!(
                "Unknown LLM provider '{}'. Supported: {}",
                self.llm.provider,
                SUPPORTED_PROVIDERS.join(", ")
            ));
        }
        if self.agent.max_chain_length == 0 {
            return Err(eyre!("agent.max-chain-length must be at least 1"));
        }
        if self.agent.max_parallel_tasks == 0 {
            return Err(eyre!("agent.max-parallel-tasks must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(eyre!("llm.temperature must be between 0.0 and 2.0"));
        }
        if let Some(env) = &self.llm.api_key_env
            && std::env::var(env).is_err()
        {
            return Err(eyre!("LLM API key not found. Set the {} environment variable.", env));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskweave.yml
        let local_config = PathBuf::from(".taskweave.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskweave/taskweave.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskweave").join("taskweave.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Errors are swallowed here; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Completion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "ollama" or "openai"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API base URL; provider default when unset
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key (none for local servers)
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// Model used for embeddings; falls back to `model`
    #[serde(rename = "embedding-model")]
    pub embedding_model: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "qwen3:8b".to_string(),
            base_url: None,
            api_key_env: None,
            embedding_model: None,
            max_tokens: 2048,
            temperature: 0.7,
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the base URL, honouring `OLLAMA_HOST` for the ollama provider
    pub fn resolved_base_url(&self) -> String {
        debug!(provider = %self.provider, "LlmConfig::resolved_base_url: called");
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            "ollama" => match std::env::var("OLLAMA_HOST") {
                Ok(host) if !host.trim().is_empty() => normalize_host(&host),
                _ => "http://localhost:11434".to_string(),
            },
            _ => "https://api.openai.com".to_string(),
        }
    }

    /// Read the API key from the configured environment variable, if any
    pub fn api_key(&self) -> Result<Option<String>> {
        match &self.api_key_env {
            Some(env) => std::env::var(env)
                .map(Some)
                .map_err(|_| eyre!("Environment variable {} not set", env)),
            None => Ok(None),
        }
    }

    /// Model used for embedding requests
    pub fn embedding_model(&self) -> &str {
        self.embedding_model.as_deref().unwrap_or(&self.model)
    }
}

/// `OLLAMA_HOST` may be `host`, `host:port` or a full URL
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        return host.to_string();
    }
    if host.contains(':') {
        format!("http://{}", host)
    } else {
        format!("http://{}:11434", host)
    }
}

/// Agent behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tool invocations in one conversational chain
    #[serde(rename = "max-chain-length")]
    pub max_chain_length: usize,

    /// Maximum tasks of one wave running at the same time
    #[serde(rename = "max-parallel-tasks")]
    pub max_parallel_tasks: usize,

    /// Print tool invocations and warnings alongside task progress
    pub verbose: bool,

    /// Directory file tools are sandboxed to
    pub workdir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_chain_length: 5,
            max_parallel_tasks: 4,
            verbose: false,
            workdir: PathBuf::from("."),
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Environment variable holding the Google Custom Search API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Environment variable holding the search engine id
    #[serde(rename = "engine-id-env")]
    pub engine_id_env: String,

    /// Number of results returned to the model
    #[serde(rename = "max-results")]
    pub max_results: usize,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GOOGLE_SEARCH_API_KEY".to_string(),
            engine_id_env: "GOOGLE_SEARCH_ENGINE_ID".to_string(),
            max_results: 3,
            timeout_ms: 30_000,
        }
    }
}

impl SearchConfig {
    /// Credentials from the environment, when both are present
    pub fn credentials(&self) -> Option<(String, String)> {
        let key = std::env::var(&self.api_key_env).ok()?;
        let engine = std::env::var(&self.engine_id_env).ok()?;
        if key.is_empty() || engine.is_empty() {
            return None;
        }
        Some((key, engine))
    }
}
