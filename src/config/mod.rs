//! Runtime configuration, read from the environment (and `.env` via dotenv).

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which live sources head the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Both APIs, then the scraper.
    Auto,
    Api,
    Scrape,
    /// No live sources; cache then mock.
    Cache,
    /// Mock fixtures only.
    Mock,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "chain" => Ok(SourceMode::Auto),
            "api" => Ok(SourceMode::Api),
            "scrape" => Ok(SourceMode::Scrape),
            "cache" => Ok(SourceMode::Cache),
            "mock" => Ok(SourceMode::Mock),
            other => Err(format!("unknown source mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorKind {
    NameHash,
    Seeded,
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name_hash" | "hash" => Ok(PredictorKind::NameHash),
            "seeded" | "random" => Ok(PredictorKind::Seeded),
            other => Err(format!("unknown predictor '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub football_data_api_key: Option<String>,
    pub rapidapi_key: Option<String>,
    pub admin_token: Option<String>,
    pub source_mode: SourceMode,
    pub mock_fallback: bool,
    pub matches_per_day: usize,
    pub refresh_interval: Duration,
    pub source_timeout: Duration,
    pub cache_capacity: usize,
    pub display_offset: FixedOffset,
    pub predictor: PredictorKind,
    pub placeholder_lineups: bool,
    pub scrape_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: "sqlite:data/matchcast.db".to_string(),
            football_data_api_key: None,
            rapidapi_key: None,
            admin_token: None,
            source_mode: SourceMode::Auto,
            mock_fallback: true,
            matches_per_day: 5,
            refresh_interval: Duration::from_secs(6 * 60 * 60),
            source_timeout: Duration::from_secs(15),
            cache_capacity: 200,
            display_offset: Utc.fix(),
            predictor: PredictorKind::Seeded,
            placeholder_lineups: true,
            scrape_url: "https://www.flashscore.com".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(url) = get("SCRAPE_URL") {
            config.scrape_url = url;
        }
        config.football_data_api_key = get("FOOTBALL_DATA_API_KEY");
        config.rapidapi_key = get("RAPIDAPI_KEY");
        config.admin_token = get("ADMIN_TOKEN");

        config.port = parse_or(&get, "PORT", config.port)?;
        config.source_mode = parse_or(&get, "SOURCE_MODE", config.source_mode)?;
        config.predictor = parse_or(&get, "PREDICTOR", config.predictor)?;
        config.mock_fallback = bool_or(&get, "MOCK_FALLBACK", config.mock_fallback)?;
        config.placeholder_lineups =
            bool_or(&get, "PLACEHOLDER_LINEUPS", config.placeholder_lineups)?;

        config.cache_capacity = parse_or(&get, "CACHE_CAPACITY", config.cache_capacity)?;
        if config.cache_capacity == 0 {
            return Err(anyhow!("CACHE_CAPACITY must be at least 1"));
        }

        config.matches_per_day = parse_or(&get, "MATCHES_PER_DAY", config.matches_per_day)?;
        if config.matches_per_day == 0 {
            return Err(anyhow!("MATCHES_PER_DAY must be at least 1"));
        }

        let refresh_secs: u64 =
            parse_or(&get, "REFRESH_INTERVAL_SECS", config.refresh_interval.as_secs())?;
        if refresh_secs == 0 {
            return Err(anyhow!("REFRESH_INTERVAL_SECS must be at least 1"));
        }
        config.refresh_interval = Duration::from_secs(refresh_secs);

        let timeout_secs: u64 =
            parse_or(&get, "SOURCE_TIMEOUT_SECS", config.source_timeout.as_secs())?;
        config.source_timeout = Duration::from_secs(timeout_secs.max(1));

        let offset_hours: i32 = parse_or(&get, "DISPLAY_UTC_OFFSET_HOURS", 0)?;
        config.display_offset = Some(offset_hours)
            .filter(|h| (-12..=14).contains(h))
            .and_then(|h| FixedOffset::east_opt(h * 3600))
            .ok_or_else(|| anyhow!("DISPLAY_UTC_OFFSET_HOURS out of range: {}", offset_hours))?;

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// How many cached records the cache source hands back.
    pub fn cache_read_limit(&self) -> usize {
        self.matches_per_day * 2
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value for {}: '{}' ({})", key, raw, e)),
    }
}

fn bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("invalid value for {}: '{}' (expected true/false)", key, raw)),
        },
    }
}
