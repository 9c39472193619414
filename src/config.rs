use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RATE_LIMIT_PER_SECOND: u64 = 1200;
const DEFAULT_RATE_LIMIT_BURST: u32 = 2400;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub addr: SocketAddr,
    pub env_mode: String,
    pub allowed_origins: Vec<HeaderValue>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()`
    /// first if a `.env` file should be honored.
    pub fn from_env() -> anyhow::Result<Self> {
        let raw_base = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&raw_base)
            .with_context(|| format!("API_BASE_URL is not a valid URL: {}", raw_base))?;

        let port = parse_or_default("PORT", DEFAULT_PORT);
        let env_mode = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let allowed_origins = allowed_origins(&env_mode)?;

        Ok(Self {
            api_base_url,
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            env_mode,
            allowed_origins,
            rate_limit_per_second: parse_or_default("RATE_LIMIT_PER_SECOND", DEFAULT_RATE_LIMIT_PER_SECOND),
            rate_limit_burst: parse_or_default("RATE_LIMIT_BURST", DEFAULT_RATE_LIMIT_BURST),
        })
    }

    pub fn is_production(&self) -> bool {
        self.env_mode == "production"
    }
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {} value: {}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn allowed_origins(env_mode: &str) -> anyhow::Result<Vec<HeaderValue>> {
    let origins = env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|v| parse_origins(&v))
        .unwrap_or_default();

    if !origins.is_empty() {
        return Ok(origins);
    }
    if env_mode == "production" {
        anyhow::bail!("ALLOWED_ORIGINS must contain at least one valid origin in production");
    }
    Ok(vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ])
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid ALLOWED_ORIGINS entry: {}", trimmed);
                    None
                }
            }
        })
        .collect()
}
