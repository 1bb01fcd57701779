use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{check_status, http_client, FetchWindow, MatchSource, SourceError};
use crate::models::{MatchRecord, SourceKind};

const BASE_URL: &str = "https://api.football-data.org/v4";

// ── football-data.org structures ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMatch {
    pub utc_date: String,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub competition: Option<CompetitionRef>,
}

/// Names are null for fixtures whose participants are not decided yet.
#[derive(Debug, Deserialize)]
pub struct TeamRef {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompetitionRef {
    pub name: String,
}

// ── Source ──────────────────────────────────────────────────────────────────

/// Primary source: football-data.org fixtures for today and tomorrow.
pub struct FootballDataSource {
    client: Client,
    api_key: Option<String>,
}

impl FootballDataSource {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout, "matchcast/0.1")?,
            api_key,
        })
    }
}

#[async_trait]
impl MatchSource for FootballDataSource {
    fn kind(&self) -> SourceKind {
        SourceKind::FootballData
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError> {
        let api_key = self.api_key.as_ref()
            .ok_or(SourceError::MissingKey("FOOTBALL_DATA_API_KEY"))?;

        tracing::info!("Fetching matches from football-data.org…");

        let date_from = window.today.format("%Y-%m-%d").to_string();
        let date_to = window.tomorrow().format("%Y-%m-%d").to_string();

        let response = self.client
            .get(format!("{}/matches", BASE_URL))
            .query(&[("dateFrom", date_from.as_str()), ("dateTo", date_to.as_str())])
            .header("X-Auth-Token", api_key)
            .send().await?;

        let body = check_status(response).await?.text().await?;
        let data: MatchesResponse = serde_json::from_str(&body)?;

        Ok(to_records(data, window.per_day))
    }
}

/// Keep at most `limit` fixtures with both teams and a parseable kickoff.
pub fn to_records(data: MatchesResponse, limit: usize) -> Vec<MatchRecord> {
    data.matches
        .into_iter()
        .filter_map(|m| {
            let kickoff = match DateTime::parse_from_rfc3339(&m.utc_date) {
                Ok(d) => d.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!("Bad date '{}': {}", m.utc_date, e);
                    return None;
                }
            };
            let home = m.home_team.name?;
            let away = m.away_team.name?;
            let competition = m
                .competition
                .map(|c| c.name)
                .unwrap_or_else(|| "Unknown".to_string());
            Some(MatchRecord::new(home, away, competition, kickoff, SourceKind::FootballData))
        })
        .take(limit)
        .collect()
}
