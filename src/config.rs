use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Medexplain";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STATIC_DIR: &str = "frontend";

/// Per-call generation timeout. Local CPU inference on an 8B model
/// routinely takes minutes for a 1000-token answer.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 300;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medexplain_lib=info,medexplain=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown generation backend '{0}' (expected 'ollama' or 'openai')")]
    UnknownBackend(String),

    #[error("OPENAI_API_KEY must be set when using the openai backend")]
    MissingApiKey,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which generation provider implementation to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ollama,
    OpenAi,
}

impl BackendKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "ollama" | "local" => Ok(Self::Ollama),
            "openai" | "hosted" => Ok(Self::OpenAi),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }
}

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub backend: BackendKind,
    /// Overrides the backend's default model choice.
    pub model: Option<String>,
    pub ollama_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub generation_timeout: Duration,
    pub static_dir: PathBuf,
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if
    /// present. Explicit values (command-line flags) take precedence over the
    /// environment; keys are environment variable names.
    pub fn from_env_with(overrides: &HashMap<&'static str, String>) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| {
            overrides
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        })
    }

    /// Build settings from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("MEDEXPLAIN_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "MEDEXPLAIN_BIND",
                value: bind_raw.clone(),
            })?;

        let backend = match get("MEDEXPLAIN_BACKEND") {
            Some(raw) => BackendKind::parse(&raw)?,
            None => BackendKind::Ollama,
        };

        let generation_timeout = match get("MEDEXPLAIN_GENERATION_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MEDEXPLAIN_GENERATION_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        };

        let settings = Self {
            bind_addr,
            backend,
            model: get("MEDEXPLAIN_MODEL").map(|m| m.trim().to_string()),
            ollama_url: get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            generation_timeout,
            static_dir: get("MEDEXPLAIN_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == BackendKind::OpenAi && self.openai_api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_empty() {
        let settings = settings_with(&[]).unwrap();
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(settings.backend, BackendKind::Ollama);
        assert_eq!(settings.model, None);
        assert_eq!(settings.ollama_url, DEFAULT_OLLAMA_URL);
        assert_eq!(
            settings.generation_timeout,
            Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS)
        );
        assert_eq!(settings.static_dir, PathBuf::from("frontend"));
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_with(&[
            ("MEDEXPLAIN_BIND", "127.0.0.1:9000"),
            ("MEDEXPLAIN_MODEL", " phi3 "),
            ("OLLAMA_HOST", "http://gpu-box:11434"),
            ("MEDEXPLAIN_GENERATION_TIMEOUT_SECS", "45"),
        ])
        .unwrap();
        assert_eq!(settings.bind_addr.port(), 9000);
        assert_eq!(settings.model.as_deref(), Some("phi3"));
        assert_eq!(settings.ollama_url, "http://gpu-box:11434");
        assert_eq!(settings.generation_timeout, Duration::from_secs(45));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let settings = settings_with(&[("MEDEXPLAIN_MODEL", "   "), ("OLLAMA_HOST", "")]).unwrap();
        assert_eq!(settings.model, None);
        assert_eq!(settings.ollama_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn openai_backend_requires_key() {
        let err = settings_with(&[("MEDEXPLAIN_BACKEND", "openai")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);

        let settings = settings_with(&[
            ("MEDEXPLAIN_BACKEND", "OpenAI"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(settings.backend, BackendKind::OpenAi);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let err = settings_with(&[("MEDEXPLAIN_BACKEND", "gpt4all")]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownBackend("gpt4all".into()));
    }

    #[test]
    fn invalid_bind_and_timeout_rejected() {
        assert!(matches!(
            settings_with(&[("MEDEXPLAIN_BIND", "not-an-addr")]),
            Err(ConfigError::InvalidValue { key: "MEDEXPLAIN_BIND", .. })
        ));
        assert!(matches!(
            settings_with(&[("MEDEXPLAIN_GENERATION_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn explicit_overrides_take_precedence() {
        let overrides = HashMap::from([
            ("MEDEXPLAIN_BIND", "127.0.0.1:9555".to_string()),
            ("MEDEXPLAIN_BACKEND", "local".to_string()),
            ("MEDEXPLAIN_MODEL", "phi3".to_string()),
        ]);
        let settings = Settings::from_env_with(&overrides).unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:9555".parse().unwrap());
        assert_eq!(settings.backend, BackendKind::Ollama);
        assert_eq!(settings.model.as_deref(), Some("phi3"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
