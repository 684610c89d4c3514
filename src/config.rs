//! Configuration types.
//!
//! Every config reads from a lookup function so the binary can layer a `.env`
//! file underneath the process environment without mutating it.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default number of questions per set.
pub const DEFAULT_SET_SIZE: usize = 10;

/// Cached AI sets stay valid for 30 minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Client-side question acquisition settings.
#[derive(Debug, Clone)]
pub struct QuestionsConfig {
    /// Base URL of the generation backend, without trailing slash.
    pub api_base_url: String,
    /// Number of questions in a full set.
    pub set_size: usize,
    /// How long a cached AI set may be served.
    pub cache_ttl: Duration,
    /// Upper bound on a single outbound request.
    pub request_timeout: Duration,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            set_size: DEFAULT_SET_SIZE,
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl QuestionsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_base_url = lookup("ONBOARDING_API_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        let set_size = parse_or(&lookup, "ONBOARDING_SET_SIZE", defaults.set_size)?;
        if set_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ONBOARDING_SET_SIZE".into(),
                message: "must be at least 1".into(),
            });
        }
        let cache_ttl = parse_or(
            &lookup,
            "ONBOARDING_CACHE_TTL_SECS",
            defaults.cache_ttl.as_secs(),
        )?;
        let request_timeout = parse_or(
            &lookup,
            "ONBOARDING_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;

        Ok(Self {
            api_base_url,
            set_size,
            cache_ttl: Duration::from_secs(cache_ttl),
            request_timeout: Duration::from_secs(request_timeout),
        })
    }

    /// Full URL of the question endpoint.
    pub fn questions_endpoint(&self) -> String {
        format!("{}/api/onboarding/questions", self.api_base_url)
    }
}

/// HTTP server settings for the generation backend.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// libSQL database file backing the settings store.
    pub db_path: String,
    /// Optional directory for rolling log files.
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            db_path: "./data/onboarding.db".to_string(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("BACKEND_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "BACKEND_PORT", defaults.port)?,
            db_path: lookup("ONBOARDING_DB_PATH").unwrap_or(defaults.db_path),
            log_dir: lookup("ONBOARDING_LOG_DIR").filter(|dir| !dir.trim().is_empty()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// LLM-backed generation settings.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// OpenRouter key; generation is disabled without one.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub app_name: String,
    pub site_url: String,
    pub batch_attempts: u32,
    pub single_attempts: u32,
    pub batch_timeout: Duration,
    pub single_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "google/gemini-2.0-flash-001".to_string(),
            app_name: "values-in-the-loop".to_string(),
            site_url: "http://localhost:5173".to_string(),
            batch_attempts: 3,
            single_attempts: 2,
            batch_timeout: Duration::from_secs(25),
            single_timeout: Duration::from_secs(12),
        }
    }
}

impl GenerationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_key = lookup("OPENROUTER_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        Ok(Self {
            api_key,
            model: lookup("OPENROUTER_MODEL")
                .map(|m| m.trim().to_string())
                .unwrap_or(defaults.model),
            app_name: lookup("OPENROUTER_APP_NAME").unwrap_or(defaults.app_name),
            site_url: lookup("OPENROUTER_SITE_URL").unwrap_or(defaults.site_url),
            ..defaults
        })
    }
}

/// Variables read from a `.env` file, consulted only when the process
/// environment does not define the key.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Load a `.env` file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match dotenvy::from_path_iter(path) {
            Ok(iter) => Self::collect(iter),
            Err(e) if e.not_found() => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse `.env` syntax from a string.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Self::collect(dotenvy::from_read_iter(text.as_bytes()))
    }

    fn collect<R: std::io::Read>(iter: dotenvy::Iter<R>) -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item?;
            // First definition wins, as when loading into the environment.
            vars.entry(key).or_insert(value);
        }
        Ok(Self { vars })
    }

    /// Process environment first, then the file.
    pub fn var(&self, key: &str) -> Option<String> {
        process_env(key).or_else(|| self.vars.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
