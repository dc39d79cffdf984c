use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use reqwest::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend root; always ends with `/` so relative paths join under it.
    pub api_url: Url,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    pub dashboard_poll: Duration,
    pub unread_poll: Duration,
    pub store_buffer: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env file if present
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        tracing::debug!(api_url = %config.api_url, session = %config.session_file.display(), "Configuration loaded");
        Ok(config)
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(&get("MARKET_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()))?;

        let session_file = match get("MARKET_SESSION_FILE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("maalem-market")
                .join("session.json"),
        };

        Ok(Self {
            api_url,
            session_file,
            http_timeout: Duration::from_secs(parse_or(&get, "MARKET_HTTP_TIMEOUT_SECS", 15)?),
            dashboard_poll: Duration::from_secs(parse_or(&get, "MARKET_DASHBOARD_POLL_SECS", 30)?),
            unread_poll: Duration::from_secs(parse_or(&get, "MARKET_UNREAD_POLL_SECS", 3)?),
            store_buffer: parse_or(&get, "MARKET_STORE_BUFFER", 32)?,
        })
    }

    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let value = raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid { key: "MARKET_API_URL".to_string(), reason };
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}
