//! TOML Configuration File Support
//!
//! Centralized configuration loading for the relay, supporting a TOML file
//! at `~/.config/chat-relay/relay.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [completion]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o-mini"
//! max_tokens = 512
//! client_timeout_secs = 60
//! system_prompt = "You are a friendly chat bot. Keep answers short."
//! max_history_bytes = 16384
//!
//! [chunking]
//! chunk_max = 400
//! chunk_delay_ms = 2000
//!
//! [display]
//! max_line_length = 400
//!
//! [access]
//! admins = ["alice", "bob"]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::AdminList;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Completion section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionToml {
    /// API base URL
    pub base_url: Option<String>,

    /// API key
    pub api_key: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// Generation cap per completion
    pub max_tokens: Option<u32>,

    /// Wall-clock budget per completion in seconds
    pub client_timeout_secs: Option<u64>,

    /// System prompt prepended to every conversation
    pub system_prompt: Option<String>,

    /// Cap on retained conversation history in bytes (0 = unlimited)
    pub max_history_bytes: Option<usize>,
}

/// Chunking section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingToml {
    /// Chunk size limit in bytes
    pub chunk_max: Option<usize>,

    /// Idle time before a sentence-boundary flush, in milliseconds
    pub chunk_delay_ms: Option<u64>,
}

/// Display section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Maximum length of one output line in bytes
    pub max_line_length: Option<usize>,
}

/// Access section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessToml {
    /// Privileged identifiers; empty means everyone
    pub admins: Option<Vec<String>>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayToml {
    /// Completion configuration section
    pub completion: CompletionToml,

    /// Chunking configuration section
    pub chunking: ChunkingToml,

    /// Display configuration section
    pub display: DisplayToml,

    /// Access configuration section
    pub access: AccessToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved relay configuration
///
/// Use [`load_config`] to load with proper priority handling, then
/// [`ConfigOverrides::apply`] for command-line values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    /// API base URL
    pub base_url: String,

    /// API key, if the provider needs one
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Generation cap per completion
    pub max_tokens: u32,

    /// Wall-clock budget per completion
    pub client_timeout: Duration,

    /// System prompt prepended to every conversation
    pub system_prompt: Option<String>,

    /// Cap on retained conversation history in bytes (0 = unlimited)
    pub max_history_bytes: usize,

    /// Chunk size limit in bytes
    pub chunk_max: usize,

    /// Idle time before a sentence-boundary flush
    pub chunk_delay: Duration,

    /// Maximum length of one output line in bytes
    pub max_line_length: usize,

    /// Privileged identifiers
    pub admins: AdminList,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            client_timeout: Duration::from_secs(60),
            system_prompt: None,
            max_history_bytes: 16 * 1024,
            chunk_max: 400,
            chunk_delay: Duration::from_secs(2),
            max_line_length: 400,
            admins: AdminList::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl RelayConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject values the relay cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_max == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_max must be at least 1".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(ConfigError::ValidationError(
                "max_line_length must be at least 1".to_string(),
            ));
        }
        if self.client_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "client_timeout must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/chat-relay/relay.toml` or
/// `~/.config/chat-relay/relay.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chat-relay").join("relay.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<RelayConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RelayConfig, ConfigError> {
    let mut config = RelayConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RelayToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut RelayConfig, toml: &RelayToml) {
    // Completion settings
    if let Some(ref url) = toml.completion.base_url {
        config.base_url.clone_from(url);
    }
    if toml.completion.api_key.is_some() {
        config.api_key.clone_from(&toml.completion.api_key);
    }
    if let Some(ref model) = toml.completion.model {
        config.model.clone_from(model);
    }
    if let Some(max_tokens) = toml.completion.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(secs) = toml.completion.client_timeout_secs {
        config.client_timeout = Duration::from_secs(secs);
    }
    if toml.completion.system_prompt.is_some() {
        config.system_prompt.clone_from(&toml.completion.system_prompt);
    }
    if let Some(bytes) = toml.completion.max_history_bytes {
        config.max_history_bytes = bytes;
    }

    // Chunking settings
    if let Some(max) = toml.chunking.chunk_max {
        config.chunk_max = max;
    }
    if let Some(ms) = toml.chunking.chunk_delay_ms {
        config.chunk_delay = Duration::from_millis(ms);
    }

    // Display settings
    if let Some(length) = toml.display.max_line_length {
        config.max_line_length = length;
    }

    // Access settings
    if let Some(ref admins) = toml.access.admins {
        config.admins = AdminList::new(admins.iter().cloned());
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut RelayConfig) {
    if let Ok(url) = std::env::var("RELAY_BASE_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Ok(key) = std::env::var("RELAY_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
        config.api_key = Some(key);
        config.source = ConfigSource::Env;
    }
    if let Ok(model) = std::env::var("RELAY_MODEL") {
        config.model = model;
        config.source = ConfigSource::Env;
    }
    if let Ok(max_tokens) = std::env::var("RELAY_MAX_TOKENS") {
        if let Ok(n) = max_tokens.parse::<u32>() {
            config.max_tokens = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(timeout) = std::env::var("RELAY_CLIENT_TIMEOUT") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.client_timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(history) = std::env::var("RELAY_MAX_HISTORY_BYTES") {
        if let Ok(bytes) = history.parse::<usize>() {
            config.max_history_bytes = bytes;
            config.source = ConfigSource::Env;
        }
    }

    if let Ok(max) = std::env::var("RELAY_CHUNK_MAX") {
        if let Ok(n) = max.parse::<usize>() {
            config.chunk_max = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(delay) = std::env::var("RELAY_CHUNK_DELAY") {
        if let Ok(ms) = delay.parse::<u64>() {
            config.chunk_delay = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }

    if let Ok(length) = std::env::var("RELAY_MAX_LINE_LENGTH") {
        if let Ok(n) = length.parse::<usize>() {
            config.max_line_length = n;
            config.source = ConfigSource::Env;
        }
    }

    if let Ok(admins) = std::env::var("RELAY_ADMINS") {
        config.admins = AdminList::new(
            admins
                .split(',')
                .map(str::trim)
                .filter(|nick| !nick.is_empty())
                .map(String::from),
        );
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Model override
    pub model: Option<String>,

    /// Chunk size override (bytes)
    pub chunk_max: Option<usize>,

    /// Chunk delay override (milliseconds)
    pub chunk_delay_ms: Option<u64>,

    /// Client timeout override (seconds)
    pub client_timeout_secs: Option<u64>,

    /// Max tokens override
    pub max_tokens: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set chunk size override
    #[must_use]
    pub fn with_chunk_max(mut self, chunk_max: usize) -> Self {
        self.chunk_max = Some(chunk_max);
        self
    }

    /// Set chunk delay override
    #[must_use]
    pub fn with_chunk_delay_ms(mut self, ms: u64) -> Self {
        self.chunk_delay_ms = Some(ms);
        self
    }

    /// Set client timeout override
    #[must_use]
    pub fn with_client_timeout_secs(mut self, secs: u64) -> Self {
        self.client_timeout_secs = Some(secs);
        self
    }

    /// Set max tokens override
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut RelayConfig) {
        if self.model.is_some()
            || self.chunk_max.is_some()
            || self.chunk_delay_ms.is_some()
            || self.client_timeout_secs.is_some()
            || self.max_tokens.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref model) = self.model {
            config.model.clone_from(model);
        }
        if let Some(max) = self.chunk_max {
            config.chunk_max = max;
        }
        if let Some(ms) = self.chunk_delay_ms {
            config.chunk_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.client_timeout_secs {
            config.client_timeout = Duration::from_secs(secs);
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    /// Environment variables are process-global; serialize tests touching them
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Clean up all environment variables used by config loading.
    fn clear_config_env_vars() {
        for var in [
            "RELAY_BASE_URL",
            "RELAY_API_KEY",
            "OPENAI_API_KEY",
            "RELAY_MODEL",
            "RELAY_MAX_TOKENS",
            "RELAY_CLIENT_TIMEOUT",
            "RELAY_MAX_HISTORY_BYTES",
            "RELAY_CHUNK_MAX",
            "RELAY_CHUNK_DELAY",
            "RELAY_MAX_LINE_LENGTH",
            "RELAY_ADMINS",
        ] {
            std::env::remove_var(var);
        }
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.client_timeout, Duration::from_secs(60));
        assert_eq!(config.chunk_max, 400);
        assert_eq!(config.chunk_delay, Duration::from_secs(2));
        assert_eq!(config.max_line_length, 400);
        assert_eq!(config.max_history_bytes, 16 * 1024);
        assert!(config.admins.is_open());
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path_suffix() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("chat-relay/relay.toml"));
        }
    }

    // =========================================================================
    // File Loading Tests
    // =========================================================================

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_env_vars();

        let file = write_toml(
            r#"
[completion]
base_url = "http://localhost:8080/v1"
model = "local-model"
max_tokens = 128
client_timeout_secs = 15
system_prompt = "Be terse."
max_history_bytes = 2048

[chunking]
chunk_max = 200
chunk_delay_ms = 500

[display]
max_line_length = 120

[access]
admins = ["alice", "bob"]
"#,
        );

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.max_tokens, 128);
        assert_eq!(config.client_timeout, Duration::from_secs(15));
        assert_eq!(config.system_prompt.as_deref(), Some("Be terse."));
        assert_eq!(config.max_history_bytes, 2048);
        assert_eq!(config.chunk_max, 200);
        assert_eq!(config.chunk_delay, Duration::from_millis(500));
        assert_eq!(config.max_line_length, 120);
        assert!(config.admins.is_admin("alice"));
        assert!(!config.admins.is_admin("mallory"));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_env_vars();

        let file = write_toml("[chunking]\nchunk_max = 64\n");
        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.chunk_max, 64);
        assert_eq!(config.chunk_delay, Duration::from_secs(2));
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_env_vars();

        let path = PathBuf::from("/nonexistent/chat-relay/relay.toml");
        let config = load_config_from_path(Some(path)).unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let file = write_toml("[chunking\nchunk_max = ");
        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // =========================================================================
    // Environment Override Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_env_vars();

        let file = write_toml("[chunking]\nchunk_max = 64\nchunk_delay_ms = 100\n");
        std::env::set_var("RELAY_CHUNK_MAX", "32");
        std::env::set_var("RELAY_ADMINS", "carol, dave,,");
        std::env::set_var("RELAY_CHUNK_DELAY", "not-a-number");

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        clear_config_env_vars();

        assert_eq!(config.chunk_max, 32);
        assert_eq!(config.chunk_delay, Duration::from_millis(100));
        assert!(config.admins.is_admin("carol"));
        assert!(config.admins.is_admin("dave"));
        assert_eq!(config.admins.len(), 2);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_history_cap_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_env_vars();

        let file = write_toml("[completion]\nmax_history_bytes = 2048\n");
        std::env::set_var("RELAY_MAX_HISTORY_BYTES", "0");

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        clear_config_env_vars();

        assert_eq!(config.max_history_bytes, 0);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_openai_key_fallback() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_env_vars();

        std::env::set_var("OPENAI_API_KEY", "sk-fallback");
        let config = load_config_from_path(None).unwrap();
        clear_config_env_vars();

        assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));
    }

    // =========================================================================
    // CLI Override and Validation Tests
    // =========================================================================

    #[test]
    fn test_cli_overrides() {
        let mut config = RelayConfig::default();
        ConfigOverrides::new()
            .with_model("other".to_string())
            .with_chunk_max(10)
            .with_chunk_delay_ms(250)
            .with_client_timeout_secs(5)
            .with_max_tokens(42)
            .apply(&mut config);

        assert_eq!(config.model, "other");
        assert_eq!(config.chunk_max, 10);
        assert_eq!(config.chunk_delay, Duration::from_millis(250));
        assert_eq!(config.client_timeout, Duration::from_secs(5));
        assert_eq!(config.max_tokens, 42);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = RelayConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = RelayConfig {
            chunk_max: 0,
            ..RelayConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let config = RelayConfig {
            max_line_length: 0,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RelayConfig {
            client_timeout: Duration::ZERO,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
