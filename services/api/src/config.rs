//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The OpenAI-compatible endpoints the service knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    Perplexity,
}

impl ProviderKind {
    pub fn api_base(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
            ProviderKind::Perplexity => "https://api.perplexity.ai",
        }
    }

    fn key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::Perplexity => "PERPLEXITY_API_KEY",
        }
    }

    fn model_var(self) -> (&'static str, &'static str) {
        match self {
            ProviderKind::OpenAi => ("DEFAULT_MODEL", "gpt-3.5-turbo"),
            ProviderKind::DeepSeek => ("DEEPSEEK_MODEL", "deepseek-chat"),
            ProviderKind::Perplexity => ("PERPLEXITY_MODEL", "pplx-7b-online"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "perplexity" => Ok(ProviderKind::Perplexity),
            other => Err(ConfigError::InvalidValue(
                "DEFAULT_PROVIDER".to_string(),
                format!("'{}' is not one of openai, deepseek, perplexity", other),
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Perplexity => "perplexity",
        };
        f.write_str(name)
    }
}

/// Everything needed to build the completion adapter for one provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub provider: ProviderConfig,
    pub max_tokens: u32,
    /// Sampling temperature for free-form calls such as market lookups.
    pub temperature: f32,
    pub model_timeout: Duration,
    pub default_region: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:5000"))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load the Model Provider ---
        let kind: ProviderKind = var_or("DEFAULT_PROVIDER", "openai").parse()?;
        let api_key = lookup(kind.key_var())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar(kind.key_var().to_string()))?;
        let (model_var, model_default) = kind.model_var();
        let provider = ProviderConfig {
            kind,
            api_key,
            model: var_or(model_var, model_default),
        };

        // --- Load Generation Settings ---
        let max_tokens = parse_var("MAX_TOKENS", &var_or("MAX_TOKENS", "1000"))?;
        let temperature = parse_var("TEMPERATURE", &var_or("TEMPERATURE", "0.7"))?;
        let timeout_secs: u64 = parse_var("MODEL_TIMEOUT_SECS", &var_or("MODEL_TIMEOUT_SECS", "300"))?;
        let default_region = var_or("DEFAULT_REGION", "North America");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            provider,
            max_tokens,
            temperature,
            model_timeout: Duration::from_secs(timeout_secs),
            default_region,
        })
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/paths"), ("OPENAI_API_KEY", "sk-test")])
            .unwrap();
        assert_eq!(config.bind_address.port(), 5000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 1000);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.model_timeout, Duration::from_secs(300));
        assert_eq!(config.default_region, "North America");
    }

    #[test]
    fn selected_provider_needs_its_own_key() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/paths"),
            ("DEFAULT_PROVIDER", "deepseek"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "DEEPSEEK_API_KEY"));

        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/paths"),
            ("DEFAULT_PROVIDER", "Perplexity"),
            ("PERPLEXITY_API_KEY", "pplx-key"),
        ])
        .unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Perplexity);
        assert_eq!(config.provider.model, "pplx-7b-online");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("OPENAI_API_KEY", "sk-test")]),
            Err(ConfigError::MissingVar(ref v)) if v == "DATABASE_URL"
        ));
        assert!(matches!(
            load(&[
                ("DATABASE_URL", "postgres://localhost/paths"),
                ("OPENAI_API_KEY", "sk-test"),
                ("DEFAULT_PROVIDER", "gemini"),
            ]),
            Err(ConfigError::InvalidValue(ref v, _)) if v == "DEFAULT_PROVIDER"
        ));
        assert!(matches!(
            load(&[
                ("DATABASE_URL", "postgres://localhost/paths"),
                ("OPENAI_API_KEY", "sk-test"),
                ("MAX_TOKENS", "lots"),
            ]),
            Err(ConfigError::InvalidValue(ref v, _)) if v == "MAX_TOKENS"
        ));
    }
}
