//! Match sources tried by the fallback chain, in priority order.

pub mod api_football;
pub mod cache;
pub mod flashscore;
pub mod football_data;
pub mod mock;

pub use api_football::ApiFootballSource;
pub use cache::CacheSource;
pub use flashscore::FlashscoreSource;
pub use football_data::FootballDataSource;
pub use mock::MockSource;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, FixedOffset, NaiveDate};
use sqlx::SqlitePool;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, SourceMode};
use crate::models::{MatchRecord, SourceKind};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} not set")]
    MissingKey(&'static str),
    #[error("HTTP {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API rejected the request: {0}")]
    Rejected(String),
    #[error("could not parse page: {0}")]
    Parse(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// The days a refresh covers: today and tomorrow in the display time zone.
#[derive(Debug, Clone)]
pub struct FetchWindow {
    pub today: NaiveDate,
    pub offset: FixedOffset,
    pub per_day: usize,
}

impl FetchWindow {
    pub fn new(today: NaiveDate, offset: FixedOffset, per_day: usize) -> Self {
        Self { today, offset, per_day }
    }

    pub fn current(config: &Config) -> Self {
        Self::new(
            crate::utils::today_in(&config.display_offset),
            config.display_offset,
            config.matches_per_day,
        )
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today + ChronoDuration::days(1)
    }

    pub fn days(&self) -> [NaiveDate; 2] {
        [self.today, self.tomorrow()]
    }
}

/// A capability that can produce match records.
#[async_trait]
pub trait MatchSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError>;
}

/// Build the chain's sources for the configured mode, highest priority first.
pub fn build_sources(
    config: &Config,
    pool: &SqlitePool,
) -> Result<Vec<Box<dyn MatchSource>>, SourceError> {
    let timeout = config.source_timeout;
    let mut sources: Vec<Box<dyn MatchSource>> = Vec::new();

    let (apis, scrape, cache) = match config.source_mode {
        SourceMode::Auto => (true, true, true),
        SourceMode::Api => (true, false, true),
        SourceMode::Scrape => (false, true, true),
        SourceMode::Cache => (false, false, true),
        SourceMode::Mock => (false, false, false),
    };

    if apis {
        let football_data_key = config.football_data_api_key.clone();
        sources.push(Box::new(FootballDataSource::new(football_data_key, timeout)?));
        sources.push(Box::new(ApiFootballSource::new(config.rapidapi_key.clone(), timeout)?));
    }
    if scrape {
        sources.push(Box::new(FlashscoreSource::new(config.scrape_url.clone(), timeout)?));
    }
    if cache {
        sources.push(Box::new(CacheSource::new(pool.clone(), config.cache_read_limit())));
    }
    if config.mock_fallback || config.source_mode == SourceMode::Mock {
        sources.push(Box::new(MockSource::new()));
    }

    Ok(sources)
}

pub(crate) fn http_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

/// Turn a non-2xx response into `SourceError::Status`, keeping the body for the log.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, SourceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status { status, body: body.chars().take(200).collect() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(config: &Config, pool: &SqlitePool) -> Vec<SourceKind> {
        build_sources(config, pool).unwrap().iter().map(|s| s.kind()).collect()
    }

    #[tokio::test]
    async fn auto_mode_uses_full_chain() {
        let pool = crate::db::test_pool().await;
        let config = Config::default();

        assert_eq!(
            kinds(&config, &pool),
            vec![
                SourceKind::FootballData,
                SourceKind::ApiFootball,
                SourceKind::Flashscore,
                SourceKind::Cache,
                SourceKind::Mock,
            ]
        );
    }

    #[tokio::test]
    async fn modes_select_live_sources() {
        let pool = crate::db::test_pool().await;

        let scrape = Config { source_mode: SourceMode::Scrape, mock_fallback: false, ..Config::default() };
        assert_eq!(kinds(&scrape, &pool), vec![SourceKind::Flashscore, SourceKind::Cache]);

        let api = Config { source_mode: SourceMode::Api, ..Config::default() };
        assert_eq!(
            kinds(&api, &pool),
            vec![SourceKind::FootballData, SourceKind::ApiFootball, SourceKind::Cache, SourceKind::Mock]
        );

        let mock = Config { source_mode: SourceMode::Mock, mock_fallback: false, ..Config::default() };
        assert_eq!(kinds(&mock, &pool), vec![SourceKind::Mock]);
    }

    #[test]
    fn window_covers_today_and_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let window = FetchWindow::new(today, FixedOffset::east_opt(0).unwrap(), 5);
        assert_eq!(window.days()[1], NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
