use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

// Proxy settings; the only place the upstream key lives
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub upstream_timeout: Duration,
    pub host: String,
    pub port: u16,
}

// Chat client settings, usable from a front end without any secret
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub client_timeout: Duration,
}

impl ProxySettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    // Lookup-driven so tests never touch the process environment
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("GROQ_API_KEY"))?;

        Ok(Self {
            api_key,
            base_url: base_url(&lookup, "GROQ_BASE_URL", DEFAULT_BASE_URL),
            model: lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or(&lookup, "CHAT_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            upstream_timeout: Duration::from_secs(parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 30)?),
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
        })
    }
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_base: base_url(&lookup, "CHAT_API_BASE", DEFAULT_API_BASE),
            client_timeout: Duration::from_secs(parse_or(&lookup, "CHAT_CLIENT_TIMEOUT_SECS", 20)?),
        })
    }
}

fn base_url<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn proxy(pairs: &[(&str, &str)]) -> Result<ProxySettings, ConfigError> {
        let vars = vars(pairs);
        ProxySettings::from_source(|key| vars.get(key).cloned())
    }

    fn client(pairs: &[(&str, &str)]) -> Result<ClientSettings, ConfigError> {
        let vars = vars(pairs);
        ClientSettings::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn proxy_defaults_apply_when_only_key_is_set() {
        let s = proxy(&[("GROQ_API_KEY", "gsk_test")]).unwrap();
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(s.upstream_timeout, Duration::from_secs(30));
        assert_eq!(s.port, 8080);
    }

    #[test]
    fn proxy_requires_api_key() {
        let err = proxy(&[("GROQ_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GROQ_API_KEY")));
    }

    #[test]
    fn client_loads_without_api_key() {
        let s = client(&[("CHAT_API_BASE", "https://chat.example.org/")]).unwrap();
        assert_eq!(s.api_base, "https://chat.example.org");
        assert_eq!(s.client_timeout, Duration::from_secs(20));

        let s = client(&[]).unwrap();
        assert_eq!(s.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn bad_numbers_name_the_key() {
        let err = proxy(&[("GROQ_API_KEY", "k"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: \"eighty\"");

        let err = client(&[("CHAT_CLIENT_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CHAT_CLIENT_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let s = proxy(&[("GROQ_API_KEY", "k"), ("GROQ_BASE_URL", "http://localhost:9000/v1/")]).unwrap();
        assert_eq!(s.base_url, "http://localhost:9000/v1");
    }
}
