//! Client configuration loaded from the environment
//!
//! Values come from process env vars, optionally seeded from a `.env` file
//! by [`load_dotenv`].

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::api::Attribution;
use crate::models::DEFAULT_MODEL;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
/// AI replies can take a long time to generate
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_READ_RETRIES: u32 = 1;

/// Where the session token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreKind {
    File,
    Keyring,
    Memory,
}

impl TokenStoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "keyring" => Some(Self::Keyring),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    /// Extra attempts for idempotent reads. Sends are never retried.
    pub read_retries: u32,
    pub token_store: TokenStoreKind,
    pub storage_dir: PathBuf,
    pub default_model: String,
    /// Passed through on registration
    pub attribution: Attribution,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            read_retries: DEFAULT_READ_RETRIES,
            token_store: TokenStoreKind::File,
            storage_dir: default_storage_dir(),
            default_model: DEFAULT_MODEL.to_string(),
            attribution: Attribution::default(),
        }
    }
}

impl ClientConfig {
    /// Build config from `METERED_CHAT_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("METERED_CHAT_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("METERED_CHAT_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid METERED_CHAT_TIMEOUT_SECS"),
            }
        }

        if let Some(raw) = lookup("METERED_CHAT_READ_RETRIES") {
            match raw.trim().parse::<u32>() {
                Ok(retries) => config.read_retries = retries,
                Err(_) => warn!(value = %raw, "Ignoring invalid METERED_CHAT_READ_RETRIES"),
            }
        }

        if let Some(raw) = lookup("METERED_CHAT_TOKEN_STORE") {
            match TokenStoreKind::parse(&raw) {
                Some(kind) => config.token_store = kind,
                None => warn!(value = %raw, "Unknown METERED_CHAT_TOKEN_STORE, using file"),
            }
        }

        if let Some(dir) = lookup("METERED_CHAT_STORAGE_DIR").filter(|v| !v.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(model) = lookup("METERED_CHAT_DEFAULT_MODEL").filter(|v| !v.trim().is_empty()) {
            config.default_model = model.trim().to_string();
        }

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        config.attribution = Attribution {
            utm_source: non_empty("METERED_CHAT_UTM_SOURCE"),
            utm_medium: non_empty("METERED_CHAT_UTM_MEDIUM"),
            utm_campaign: non_empty("METERED_CHAT_UTM_CAMPAIGN"),
            referrer: non_empty("METERED_CHAT_REFERRER"),
        };

        config
    }
}

/// Load a `.env` file from the working directory, falling back to its parent
pub fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("metered-chat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = config_from(&[]);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.read_retries, 1);
        assert_eq!(config.token_store, TokenStoreKind::File);
        assert_eq!(config.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("METERED_CHAT_API_URL", "https://proxy.example.com/api/"),
            ("METERED_CHAT_TIMEOUT_SECS", "30"),
            ("METERED_CHAT_READ_RETRIES", "0"),
            ("METERED_CHAT_TOKEN_STORE", "Keyring"),
            ("METERED_CHAT_STORAGE_DIR", "/tmp/mc"),
            ("METERED_CHAT_DEFAULT_MODEL", "openai/gpt-4o"),
        ]);
        assert_eq!(config.api_url, "https://proxy.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.read_retries, 0);
        assert_eq!(config.token_store, TokenStoreKind::Keyring);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/mc"));
        assert_eq!(config.default_model, "openai/gpt-4o");
        assert_eq!(config.attribution.utm_source, None);
    }

    #[test]
    fn test_attribution_from_env() {
        let config = config_from(&[
            ("METERED_CHAT_UTM_SOURCE", "telegram"),
            ("METERED_CHAT_REFERRER", ""),
        ]);
        assert_eq!(config.attribution.utm_source.as_deref(), Some("telegram"));
        assert_eq!(config.attribution.referrer, None);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("METERED_CHAT_TIMEOUT_SECS", "soon"),
            ("METERED_CHAT_READ_RETRIES", "-1"),
            ("METERED_CHAT_TOKEN_STORE", "cloud"),
        ]);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.read_retries, 1);
        assert_eq!(config.token_store, TokenStoreKind::File);
    }
}
