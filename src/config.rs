use std::{fmt, net::IpAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use tracing::info;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_GENERATION_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Process configuration, read once at startup and handed to the router.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub generation: GenerationSettings,
}

/// Where the API key travels on the outbound call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPlacement {
    Query,
    Header,
}

impl FromStr for KeyPlacement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(KeyPlacement::Query),
            "header" => Ok(KeyPlacement::Header),
            other => Err(anyhow!("expected `query` or `header`, got `{other}`")),
        }
    }
}

#[derive(Clone)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub key_placement: KeyPlacement,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
}

// The key must never end up in logs.
impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("key_placement", &self.key_placement)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_base", &self.retry_base)
            .finish()
    }
}

impl GenerationSettings {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            key_placement: KeyPlacement::Query,
            timeout: Duration::from_millis(30_000),
            max_retries: 2,
            retry_base: Duration::from_millis(250),
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(&lookup, "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let endpoint = lookup("GEMINI_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GENERATION_URL.to_string());
        let api_key = lookup("GEMINI_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let generation = GenerationSettings {
            endpoint,
            api_key,
            key_placement: parse_or(&lookup, "GEMINI_KEY_PLACEMENT", KeyPlacement::Query)?,
            timeout: Duration::from_millis(parse_or(&lookup, "GENERATION_TIMEOUT_MS", 30_000u64)?),
            max_retries: parse_or(&lookup, "GENERATION_MAX_RETRIES", 2u32)?,
            retry_base: Duration::from_millis(parse_or(
                &lookup,
                "GENERATION_RETRY_BASE_MS",
                250u64,
            )?),
        };

        Ok(Self {
            bind_addr,
            port,
            generation,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Debug,
    T::Err: fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: `{raw}`")),
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}
