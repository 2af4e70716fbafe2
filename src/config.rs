//! Runtime configuration read from the environment (after `.env` loading).

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const TOKEN_ENV: &str = "COURT_API_TOKEN";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub session_file: Option<PathBuf>,
    pub token_env: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            session_file: None,
            token_env: TOKEN_ENV.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConsoleConfig {
    /// Reads `COURT_API_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("COURT_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url;
        }
        config.session_file = lookup("COURT_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        if let Some(secs) = lookup("COURT_API_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("COURT_API_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("COURT_API_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("COURT_API_CONNECT_TIMEOUT_SECS", &secs)?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got '{raw}'"))?;
    Ok(Duration::from_secs(secs))
}
