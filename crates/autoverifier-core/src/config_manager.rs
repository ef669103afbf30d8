use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for AutoVerifier
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutoVerifierConfig {
    /// LLM provider used for verification and claim analysis
    #[serde(default)]
    pub llm: LLMConfig,

    /// Claim verifier and workflow limits
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Trust score weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Follow-up query generation
    #[serde(default)]
    pub refinement: RefinementConfig,

    /// Source credibility table overrides
    #[serde(default)]
    pub credibility: CredibilityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Disable to run the trust workflow with heuristics only
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// LLM provider: "gemini", "openai-compatible", "ollama", "lmstudio"
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Model identifier
    /// For Gemini: model name (e.g., "gemini-1.5-flash")
    /// For Ollama: model name (e.g., "llama3.1:8b")
    /// For OpenAI-compatible: custom model name
    #[serde(default)]
    pub model: Option<String>,

    /// Google Generative Language API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// OpenAI-compatible base URL (for custom endpoints)
    #[serde(default)]
    pub openai_compatible_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_lmstudio_url")]
    pub lmstudio_url: String,

    /// Low temperature keeps verdicts consistent across runs
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_llm_provider(),
            model: None,
            gemini_api_key: None,
            gemini_base_url: default_gemini_base_url(),
            openai_compatible_url: None,
            openai_api_key: None,
            ollama_url: default_ollama_url(),
            lmstudio_url: default_lmstudio_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_window: default_context_window(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Maximum claims verified concurrently in a batch
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Verifier/refinement passes before the workflow gives up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    #[serde(default = "default_true")]
    pub require_multiple_sources: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            max_iterations: default_max_iterations(),
            confidence_threshold: default_confidence_threshold(),
            require_multiple_sources: true,
        }
    }
}

/// Weights for the trust score heuristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_stance_bonus")]
    pub stance_bonus: f64,

    /// Penalty per detected fallacy
    #[serde(default = "default_fallacy_penalty")]
    pub fallacy_penalty: f64,

    #[serde(default = "default_max_penalized_fallacies")]
    pub max_penalized_fallacies: usize,

    #[serde(default = "default_length_bonus")]
    pub length_bonus: f64,

    /// Content length (characters) that earns the length bonus
    #[serde(default = "default_length_threshold")]
    pub length_threshold: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            stance_bonus: default_stance_bonus(),
            fallacy_penalty: default_fallacy_penalty(),
            max_penalized_fallacies: default_max_penalized_fallacies(),
            length_bonus: default_length_bonus(),
            length_threshold: default_length_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    #[serde(default = "default_high_trust_threshold")]
    pub high_trust_threshold: f64,

    #[serde(default = "default_low_trust_threshold")]
    pub low_trust_threshold: f64,

    /// High-trust items needed before the evidence counts as sufficient
    #[serde(default = "default_min_high_trust")]
    pub min_high_trust: usize,

    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,

    /// Results included in the trust summary sent to the LLM
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,

    /// Sites targeted when nothing has been analyzed yet
    #[serde(default = "default_primary_sites")]
    pub primary_sites: Vec<String>,

    /// Sites targeted when the LLM cannot propose a query
    #[serde(default = "default_fallback_sites")]
    pub fallback_sites: Vec<String>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            high_trust_threshold: default_high_trust_threshold(),
            low_trust_threshold: default_low_trust_threshold(),
            min_high_trust: default_min_high_trust(),
            max_query_chars: default_max_query_chars(),
            summary_limit: default_summary_limit(),
            primary_sites: default_primary_sites(),
            fallback_sites: default_fallback_sites(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredibilityConfig {
    /// Domain -> score overrides merged over the built-in outlet table
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_llm_provider() -> String {
    "gemini".to_string()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_lmstudio_url() -> String {
    "http://localhost:1234".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> usize {
    1024
}
fn default_context_window() -> usize {
    1_000_000
} // gemini-1.5-flash
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_max_concurrent() -> usize {
    4
}
fn default_max_iterations() -> u32 {
    3
}
fn default_confidence_threshold() -> f64 {
    0.7
}
fn default_stance_bonus() -> f64 {
    0.05
}
fn default_fallacy_penalty() -> f64 {
    0.10
}
fn default_max_penalized_fallacies() -> usize {
    2
}
fn default_length_bonus() -> f64 {
    0.05
}
fn default_length_threshold() -> usize {
    600
}
fn default_high_trust_threshold() -> f64 {
    0.75
}
fn default_low_trust_threshold() -> f64 {
    0.4
}
fn default_min_high_trust() -> usize {
    2
}
fn default_max_query_chars() -> usize {
    140
}
fn default_summary_limit() -> usize {
    8
}
fn default_primary_sites() -> Vec<String> {
    vec!["reuters.com".to_string(), "apnews.com".to_string()]
}
fn default_fallback_sites() -> Vec<String> {
    vec![
        "reuters.com".to_string(),
        "apnews.com".to_string(),
        "bbc.com".to_string(),
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

pub const LOCAL_CONFIG_FILE: &str = ".autoverifier.toml";

/// Upper bound for `llm.max_retries`
pub const MAX_LLM_RETRIES: u32 = 10;

/// Configuration manager with smart defaults
pub struct ConfigManager {
    config: AutoVerifierConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.autoverifier.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_path(None)
    }

    /// Like [`ConfigManager::load`], but an explicit path replaces the file search
    pub fn load_with_path(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                (Self::read_toml_file(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_config_file()?,
        };

        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        info!(
            config_file = %config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "NONE (using defaults)".to_string()),
            provider = %config.llm.provider,
            model = ?config.llm.model,
            llm_enabled = config.llm.enabled,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Build a manager around an already-assembled configuration
    pub fn from_config(config: AutoVerifierConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".autoverifier.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .autoverifier.env: {}", e);
                } else {
                    info!("Loaded .autoverifier.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.autoverifier.toml (current directory)
    /// 2. ~/.autoverifier/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(AutoVerifierConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        info!("No config file found, using defaults");
        Ok((AutoVerifierConfig::default(), None))
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".autoverifier").join("config.toml"))
    }

    /// Read TOML config file
    pub fn read_toml_file(path: &Path) -> Result<AutoVerifierConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: AutoVerifierConfig) -> AutoVerifierConfig {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(mut config: AutoVerifierConfig, lookup: F) -> AutoVerifierConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        // LLM configuration
        if let Some(key) = lookup("GOOGLE_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            config.llm.gemini_api_key = Some(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            config.llm.openai_api_key = Some(key);
        }
        if let Some(provider) = lookup("AUTOVERIFIER_LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(model) = lookup("AUTOVERIFIER_MODEL") {
            config.llm.model = Some(model);
        }
        if let Some(url) = lookup("AUTOVERIFIER_OPENAI_COMPATIBLE_URL") {
            config.llm.openai_compatible_url = Some(url);
        }
        if let Some(temp) = lookup("AUTOVERIFIER_TEMPERATURE") {
            match temp.parse() {
                Ok(t) => config.llm.temperature = t,
                Err(_) => warn!("Ignoring unparsable AUTOVERIFIER_TEMPERATURE={}", temp),
            }
        }

        // Workflow
        if let Some(iterations) = lookup("AUTOVERIFIER_MAX_ITERATIONS") {
            match iterations.parse() {
                Ok(n) => config.verifier.max_iterations = n,
                Err(_) => warn!(
                    "Ignoring unparsable AUTOVERIFIER_MAX_ITERATIONS={}",
                    iterations
                ),
            }
        }

        // Logging
        if let Some(level) = lookup("AUTOVERIFIER_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("AUTOVERIFIER_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &AutoVerifierConfig) -> Result<(), ConfigError> {
        match config.llm.provider.as_str() {
            "gemini" | "openai-compatible" | "ollama" | "lmstudio" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid LLM provider: {}. Must be one of: gemini, openai-compatible, ollama, lmstudio",
                    other
                )))
            }
        }

        if !(0.0..=2.0).contains(&config.llm.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                config.llm.temperature
            )));
        }

        if config.llm.max_retries > MAX_LLM_RETRIES {
            return Err(ConfigError::ValidationError(format!(
                "max_retries must be at most {}, got: {}",
                MAX_LLM_RETRIES, config.llm.max_retries
            )));
        }

        if config.verifier.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationError(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        let unit_interval = [
            ("confidence_threshold", config.verifier.confidence_threshold),
            (
                "high_trust_threshold",
                config.refinement.high_trust_threshold,
            ),
            ("low_trust_threshold", config.refinement.low_trust_threshold),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be between 0 and 1, got: {}",
                    name, value
                )));
            }
        }

        if config.refinement.low_trust_threshold >= config.refinement.high_trust_threshold {
            return Err(ConfigError::ValidationError(format!(
                "low_trust_threshold ({}) must be below high_trust_threshold ({})",
                config.refinement.low_trust_threshold, config.refinement.high_trust_threshold
            )));
        }

        for (domain, score) in &config.credibility.overrides {
            if !(0.0..=1.0).contains(score) {
                return Err(ConfigError::ValidationError(format!(
                    "Credibility override for {} must be between 0 and 1, got: {}",
                    domain, score
                )));
            }
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &AutoVerifierConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = AutoVerifierConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            }
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}
