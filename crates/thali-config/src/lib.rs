//! Process configuration for the thali server.
//!
//! Everything is read from the environment once at startup:
//!
//! - [`ServerConfig`] — Bind address, static asset directory, and the nested settings
//! - [`LlmSettings`] — Model, credential, and sampling parameters
//! - [`AgentSettings`] — System prompt and iteration cap
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use thali_config::ServerConfig;
//!
//! let vars = HashMap::from([("GOOGLE_API_KEY", "test-key")]);
//! let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
//!
//! assert_eq!(config.port, 3000);
//! assert_eq!(config.agent.max_iterations, 3);
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thali_core::Provider;

/// Default model used when `LLM_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Instruction given to the agent on every run.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that uses tools when needed.";

/// Errors that can occur when loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("Missing required environment variable '{0}'")]
    Missing(&'static str),

    /// A variable is present but its value could not be parsed.
    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    /// Creates an invalid-value error.
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid { key, message: message.into() }
    }
}

/// Settings for the LLM provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Model name, e.g. `gemini-2.5-flash` or `models/gemini-2.5-flash`.
    pub model: String,
    /// Credential for the provider selected by `model`.
    pub api_key: String,
    /// Optional alternative endpoint base URL.
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Per-request timeout for provider calls. `None` means no timeout.
    pub timeout: Option<Duration>,
}

impl LlmSettings {
    /// Provider family for the configured model.
    pub fn provider(&self) -> Provider {
        Provider::for_model(&self.model)
    }
}

/// Settings for the agent executor.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub system_prompt: String,
    /// Maximum number of reasoning/tool-call rounds.
    pub max_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: 3,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html`, relative to the working directory.
    pub static_dir: PathBuf,
    pub llm: LlmSettings,
    pub agent: AgentSettings,
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through the given variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let key_var = Provider::for_model(&model).api_key_var();
        let api_key = get(key_var).ok_or(ConfigError::Missing(key_var))?;

        let llm = LlmSettings {
            model,
            api_key,
            api_base: get("LLM_API_BASE"),
            temperature: parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", 0.7)?,
            max_output_tokens: parse_or(get("LLM_MAX_OUTPUT_TOKENS"), "LLM_MAX_OUTPUT_TOKENS", 2048)?,
            timeout: parse_opt::<u64>(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        };

        let max_iterations = parse_or(get("AGENT_MAX_ITERATIONS"), "AGENT_MAX_ITERATIONS", 3usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::invalid("AGENT_MAX_ITERATIONS", "must be at least 1"));
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 3000u16)?,
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("public")),
            llm,
            agent: AgentSettings {
                max_iterations,
                ..AgentSettings::default()
            },
        })
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_opt<T>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| v.trim().parse::<T>().map_err(|e| ConfigError::invalid(key, format!("'{}': {}", v, e))))
        .transpose()
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(value, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_menu_service() {
        let config = load(&[("GOOGLE_API_KEY", "k")]).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.provider(), Provider::Gemini);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.max_output_tokens, 2048);
        assert!(config.llm.timeout.is_none());
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn missing_google_key_is_reported() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GOOGLE_API_KEY")));
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let err = load(&[("GOOGLE_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GOOGLE_API_KEY")));
    }

    #[test]
    fn openai_models_need_openai_key() {
        let err = load(&[("LLM_MODEL", "gpt-4o-mini"), ("GOOGLE_API_KEY", "k")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));

        let config = load(&[("LLM_MODEL", "gpt-4o-mini"), ("OPENAI_API_KEY", "sk")]).unwrap();
        assert_eq!(config.llm.provider(), Provider::OpenAi);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("GOOGLE_API_KEY", "k"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("STATIC_DIR", "web"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("AGENT_MAX_ITERATIONS", "5"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.static_dir, PathBuf::from("web"));
        assert_eq!(config.llm.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.agent.max_iterations, 5);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = load(&[("GOOGLE_API_KEY", "k"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = load(&[("GOOGLE_API_KEY", "k"), ("AGENT_MAX_ITERATIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "AGENT_MAX_ITERATIONS", .. }));
    }
}
