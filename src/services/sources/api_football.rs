use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{check_status, http_client, FetchWindow, MatchSource, SourceError};
use crate::models::{MatchRecord, SourceKind};

const BASE_URL: &str = "https://api-football-v1.p.rapidapi.com/v3";
const RAPIDAPI_HOST: &str = "api-football-v1.p.rapidapi.com";

// ── API-Football structures ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FixturesResponse {
    /// An empty array on success, an object of messages otherwise.
    #[serde(default)]
    pub errors: serde_json::Value,
    #[serde(default)]
    pub response: Vec<FixtureEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureEntry {
    pub fixture: FixtureInfo,
    pub league: LeagueInfo,
    pub teams: FixtureTeams,
}

#[derive(Debug, Deserialize)]
pub struct FixtureInfo {
    pub date: DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Deserialize)]
pub struct LeagueInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureTeams {
    pub home: TeamInfo,
    pub away: TeamInfo,
}

#[derive(Debug, Deserialize)]
pub struct TeamInfo {
    pub name: String,
}

impl FixturesResponse {
    fn rejection(&self) -> Option<String> {
        match &self.errors {
            serde_json::Value::Object(map) if !map.is_empty() => Some(self.errors.to_string()),
            serde_json::Value::Array(items) if !items.is_empty() => Some(self.errors.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

// ── Source ──────────────────────────────────────────────────────────────────

/// Alternate source: API-Football through RapidAPI, one request per day.
pub struct ApiFootballSource {
    client: Client,
    api_key: Option<String>,
}

impl ApiFootballSource {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout, "matchcast/0.1")?,
            api_key,
        })
    }

    async fn fetch_day(
        &self,
        api_key: &str,
        day: NaiveDate,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, SourceError> {
        let date = day.format("%Y-%m-%d").to_string();
        tracing::info!("Fetching API-Football fixtures for {}…", date);

        let response = self.client
            .get(format!("{}/fixtures", BASE_URL))
            .query(&[("date", date.as_str())])
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .send().await?;

        let body = check_status(response).await?.text().await?;
        let data: FixturesResponse = serde_json::from_str(&body)?;
        to_records(data, limit)
    }
}

#[async_trait]
impl MatchSource for ApiFootballSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ApiFootball
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError> {
        let api_key = self.api_key.as_ref()
            .ok_or(SourceError::MissingKey("RAPIDAPI_KEY"))?;

        let mut days = Vec::new();
        for day in window.days() {
            days.push((day, self.fetch_day(api_key, day, window.per_day).await));
        }

        merge_days(days)
    }
}

/// Keep the days that succeeded. Only when every day failed is the first error returned.
fn merge_days(
    days: Vec<(NaiveDate, Result<Vec<MatchRecord>, SourceError>)>,
) -> Result<Vec<MatchRecord>, SourceError> {
    let mut records = Vec::new();
    let mut any_ok = false;
    let mut first_err = None;

    for (day, result) in days {
        match result {
            Ok(day_records) => {
                any_ok = true;
                records.extend(day_records);
            }
            Err(e) => {
                tracing::warn!("API-Football fixtures for {} unavailable: {}", day, e);
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(e) if !any_ok => Err(e),
        _ => Ok(records),
    }
}

pub fn to_records(data: FixturesResponse, limit: usize) -> Result<Vec<MatchRecord>, SourceError> {
    if let Some(reason) = data.rejection() {
        return Err(SourceError::Rejected(reason));
    }

    Ok(data.response
        .into_iter()
        .take(limit)
        .map(|entry| MatchRecord::new(
            entry.teams.home.name,
            entry.teams.away.name,
            entry.league.name,
            entry.fixture.date.with_timezone(&Utc),
            SourceKind::ApiFootball,
        ))
        .collect())
}
