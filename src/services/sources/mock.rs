use async_trait::async_trait;
use chrono::NaiveTime;

use super::{FetchWindow, MatchSource, SourceError};
use crate::models::{MatchRecord, SourceKind};
use crate::utils::local_to_utc;

const MOCK_TEAMS: [&str; 8] = [
    "Manchester United",
    "Liverpool",
    "Chelsea",
    "Arsenal",
    "Barcelona",
    "Real Madrid",
    "Bayern Munich",
    "PSG",
];

const MOCK_FIXTURES: usize = 3;
const FIRST_KICKOFF_HOUR: u32 = 18;

/// Last resort: three fabricated fixtures today, one hour apart from 18:00.
#[derive(Default)]
pub struct MockSource;

impl MockSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MatchSource for MockSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError> {
        Ok(mock_matches(window))
    }
}

pub fn mock_matches(window: &FetchWindow) -> Vec<MatchRecord> {
    (0..MOCK_FIXTURES)
        .filter_map(|i| {
            let time = NaiveTime::from_hms_opt(FIRST_KICKOFF_HOUR + i as u32, 0, 0)?;
            let kickoff = local_to_utc(window.today, time, &window.offset)?;
            Some(MatchRecord::new(
                MOCK_TEAMS[i],
                MOCK_TEAMS[i + 3],
                "Mock League",
                kickoff,
                SourceKind::Mock,
            ))
        })
        .collect()
}
