use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a match record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    FootballData,
    ApiFootball,
    Flashscore,
    Cache,
    Mock,
    Manual,
}

impl SourceKind {
    /// Live sources talk to the network; their results are worth caching.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SourceKind::FootballData | SourceKind::ApiFootball | SourceKind::Flashscore
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::FootballData => "football-data.org",
            SourceKind::ApiFootball => "API-Football",
            SourceKind::Flashscore => "Flashscore",
            SourceKind::Cache => "cache",
            SourceKind::Mock => "mock",
            SourceKind::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub competition: String,
    pub kickoff: DateTime<Utc>,
    pub source: SourceKind,
    pub prediction: Option<Prediction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lineup_home: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lineup_away: Vec<String>,
}

impl MatchRecord {
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        competition: impl Into<String>,
        kickoff: DateTime<Utc>,
        source: SourceKind,
    ) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            competition: competition.into(),
            kickoff,
            source,
            prediction: None,
            lineup_home: Vec::new(),
            lineup_away: Vec::new(),
        }
    }

    /// Composite identity `home_away_YYYY-MM-DD`, dated in the display time zone.
    pub fn cache_key(&self, offset: &FixedOffset) -> String {
        format!(
            "{}_{}_{}",
            self.home_team,
            self.away_team,
            self.kickoff.with_timezone(offset).format("%Y-%m-%d")
        )
    }
}

/// Placeholder match statistics. Not a statistical model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub model: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub home_possession: u8,
    pub away_possession: u8,
    pub home_shots: u8,
    pub away_shots: u8,
    pub home_shots_on_target: u8,
    pub away_shots_on_target: u8,
    pub home_fouls: u8,
    pub away_fouls: u8,
    pub corners: u8,
    pub cards: u8,
}

impl Prediction {
    pub fn score_line(&self) -> String {
        format!("{}-{}", self.home_goals, self.away_goals)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualMatch {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub competition: String,
    pub kickoff: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManualMatch {
    pub fn to_record(&self) -> MatchRecord {
        MatchRecord::new(
            self.home_team.clone(),
            self.away_team.clone(),
            self.competition.clone(),
            self.kickoff,
            SourceKind::Manual,
        )
    }
}

/// Body of admin create/update requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualMatchInput {
    pub home_team: String,
    pub away_team: String,
    #[serde(default = "default_competition")]
    pub competition: String,
    pub kickoff: DateTime<Utc>,
}

fn default_competition() -> String {
    "Friendly".to_string()
}

impl ManualMatchInput {
    pub fn validate(&self) -> Result<(), String> {
        if !crate::utils::validate_team_name(&self.home_team) {
            return Err("home_team must be 1-100 characters".to_string());
        }
        if !crate::utils::validate_team_name(&self.away_team) {
            return Err("away_team must be 1-100 characters".to_string());
        }
        if self.home_team.trim().eq_ignore_ascii_case(self.away_team.trim()) {
            return Err("home_team and away_team must differ".to_string());
        }
        Ok(())
    }
}

/// The list of matches currently shown to users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub matches: Vec<MatchRecord>,
    pub source: Option<SourceKind>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub refresh_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub match_count: usize,
    pub source: Option<SourceKind>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub refresh_count: u64,
}

impl From<&Snapshot> for StatusReport {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            match_count: snapshot.matches.len(),
            source: snapshot.source,
            last_refresh: snapshot.refreshed_at,
            refresh_count: snapshot.refresh_count,
        }
    }
}

// API Response types
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
