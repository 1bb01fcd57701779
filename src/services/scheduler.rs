use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::db::{cache_matches, list_manual_matches};
use crate::models::{MatchRecord, Snapshot, StatusReport};
use crate::services::predictor::{placeholder_lineup, predictor_for, Predictor};
use crate::services::sources::{build_sources, FetchWindow};
use crate::services::FetchChain;

pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

/// One fetch → predict → cache → publish cycle.
pub struct Refresher {
    chain: FetchChain,
    predictor: Box<dyn Predictor>,
    pool: SqlitePool,
    config: Arc<Config>,
    snapshot: SharedSnapshot,
    // Serializes cycles so a manual refresh never interleaves with the scheduled one
    cycle: Mutex<()>,
}

impl Refresher {
    pub fn new(
        chain: FetchChain,
        predictor: Box<dyn Predictor>,
        pool: SqlitePool,
        config: Arc<Config>,
        snapshot: SharedSnapshot,
    ) -> Self {
        Self {
            chain,
            predictor,
            pool,
            config,
            snapshot,
            cycle: Mutex::new(()),
        }
    }

    /// Wire the chain and predictor the config asks for.
    pub fn from_config(
        pool: SqlitePool,
        config: Arc<Config>,
        snapshot: SharedSnapshot,
    ) -> Result<Self> {
        let sources = build_sources(&config, &pool)?;
        let chain = FetchChain::new(sources, config.source_timeout);
        tracing::info!("Fallback chain: {:?}", chain.source_kinds());
        let predictor = predictor_for(config.predictor);
        Ok(Self::new(chain, predictor, pool, config, snapshot))
    }

    pub fn snapshot(&self) -> SharedSnapshot {
        self.snapshot.clone()
    }

    pub async fn refresh(&self) -> StatusReport {
        let _cycle = self.cycle.lock().await;

        let window = FetchWindow::current(&self.config);
        let outcome = self.chain.run(&window).await;

        let mut matches = outcome.matches;
        self.enrich(&mut matches);

        if outcome.source.is_some_and(|s| s.is_live()) {
            let offset = self.config.display_offset;
            let capacity = self.config.cache_capacity;
            if let Err(e) = cache_matches(&self.pool, &matches, &offset, capacity).await {
                tracing::warn!("Failed to cache matches: {}", e);
            }
        }

        let mut matches = self.merge_manual(matches).await;
        matches.sort_by_key(|m| m.kickoff);

        let mut snapshot = self.snapshot.write().await;
        let refresh_count = snapshot.refresh_count + 1;
        *snapshot = Snapshot {
            matches,
            source: outcome.source,
            refreshed_at: Some(Utc::now()),
            refresh_count,
        };

        let status = StatusReport::from(&*snapshot);
        tracing::info!(
            "Snapshot refreshed: {} matches from {}",
            status.match_count,
            status.source.map_or("no source".to_string(), |s| s.to_string())
        );
        status
    }

    /// Fill in predictions (and lineups, if enabled) for records that lack them.
    fn enrich(&self, matches: &mut [MatchRecord]) {
        for record in matches.iter_mut() {
            if record.prediction.is_none() {
                let prediction = self.predictor.predict(&record.home_team, &record.away_team);
                record.prediction = Some(prediction);
            }
            if self.config.placeholder_lineups {
                if record.lineup_home.is_empty() {
                    record.lineup_home = placeholder_lineup(&record.home_team);
                }
                if record.lineup_away.is_empty() {
                    record.lineup_away = placeholder_lineup(&record.away_team);
                }
            }
        }
    }

    /// Manual records replace chain records with the same cache key.
    async fn merge_manual(&self, mut matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
        let manual = match list_manual_matches(&self.pool).await {
            Ok(manual) => manual,
            Err(e) => {
                tracing::warn!("Failed to load manual matches: {}", e);
                return matches;
            }
        };
        if manual.is_empty() {
            return matches;
        }

        let offset = self.config.display_offset;
        let mut manual_records: Vec<MatchRecord> = manual.iter().map(|m| m.to_record()).collect();
        self.enrich(&mut manual_records);

        let mut index: HashMap<String, usize> = matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.cache_key(&offset), i))
            .collect();

        for record in manual_records {
            let key = record.cache_key(&offset);
            match index.get(&key) {
                Some(&i) => matches[i] = record,
                None => {
                    index.insert(key, matches.len());
                    matches.push(record);
                }
            }
        }

        matches
    }
}

/// Refresh once immediately, then every `every`.
pub fn spawn_scheduler(refresher: Arc<Refresher>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            tracing::info!("Scheduled refresh starting");
            refresher.refresh().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictorKind;
    use crate::models::{ManualMatchInput, SourceKind};
    use crate::services::fetch_chain::tests::{Behaviour, StubSource};
    use crate::services::sources::{mock::mock_matches, MockSource};

    fn refresher_with(
        pool: SqlitePool,
        sources: Vec<Box<dyn crate::services::sources::MatchSource>>,
        config: Config,
    ) -> Refresher {
        Refresher::new(
            FetchChain::new(sources, Duration::from_secs(1)),
            predictor_for(PredictorKind::NameHash),
            pool,
            Arc::new(config),
            Arc::new(RwLock::new(Snapshot::default())),
        )
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_and_counts() {
        let pool = crate::db::test_pool().await;
        let refresher = refresher_with(pool, vec![Box::new(MockSource::new())], Config::default());

        let first = refresher.refresh().await;
        let second = refresher.refresh().await;

        assert_eq!(first.match_count, 3);
        assert_eq!(second.refresh_count, 2);

        let snapshot = refresher.snapshot();
        let snapshot = snapshot.read().await;
        assert_eq!(snapshot.matches.len(), second.match_count);
        assert_eq!(snapshot.source, Some(SourceKind::Mock));
        assert!(snapshot.matches.iter().all(|m| m.prediction.is_some()));
        assert!(snapshot.matches.iter().all(|m| m.lineup_home.len() == 11));
    }

    #[tokio::test]
    async fn only_live_results_are_cached() {
        let pool = crate::db::test_pool().await;

        let (live, _) = StubSource::boxed(SourceKind::Flashscore, Behaviour::Yield(2));
        refresher_with(pool.clone(), vec![live], Config::default()).refresh().await;
        assert_eq!(crate::db::count_cached(&pool).await.unwrap(), 2);

        crate::db::clear_cache(&pool).await.unwrap();
        refresher_with(pool.clone(), vec![Box::new(MockSource::new())], Config::default()).refresh().await;
        assert_eq!(crate::db::count_cached(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cached_records_keep_their_predictions() {
        let pool = crate::db::test_pool().await;
        let (live, _) = StubSource::boxed(SourceKind::Flashscore, Behaviour::Yield(1));
        refresher_with(pool.clone(), vec![live], Config::default()).refresh().await;

        let cached = crate::db::get_cached_matches(&pool, 10).await.unwrap();
        assert!(cached[0].prediction.is_some());
    }

    #[tokio::test]
    async fn lineups_can_be_disabled() {
        let pool = crate::db::test_pool().await;
        let config = Config { placeholder_lineups: false, ..Config::default() };
        let refresher = refresher_with(pool, vec![Box::new(MockSource::new())], config);
        refresher.refresh().await;

        let snapshot = refresher.snapshot();
        assert!(snapshot.read().await.matches.iter().all(|m| m.lineup_home.is_empty()));
    }

    #[tokio::test]
    async fn manual_matches_override_by_key() {
        let pool = crate::db::test_pool().await;
        let config = Config::default();
        let mock = mock_matches(&FetchWindow::current(&config));

        // Same fixture as the first mock match, plus one new fixture
        crate::db::insert_manual_match(&pool, &ManualMatchInput {
            home_team: mock[0].home_team.clone(),
            away_team: mock[0].away_team.clone(),
            competition: "Derby Day".to_string(),
            kickoff: mock[0].kickoff,
        }).await.unwrap();
        crate::db::insert_manual_match(&pool, &ManualMatchInput {
            home_team: "Fluminense".to_string(),
            away_team: "Botafogo".to_string(),
            competition: "Carioca".to_string(),
            kickoff: mock[0].kickoff,
        }).await.unwrap();

        let refresher = refresher_with(pool, vec![Box::new(MockSource::new())], config);
        let status = refresher.refresh().await;
        assert_eq!(status.match_count, 4);

        let snapshot = refresher.snapshot();
        let snapshot = snapshot.read().await;
        let overridden: Vec<_> = snapshot.matches.iter().filter(|m| m.home_team == mock[0].home_team).collect();
        assert_eq!(overridden.len(), 1);
        assert_eq!(overridden[0].competition, "Derby Day");
        assert_eq!(overridden[0].source, SourceKind::Manual);
    }

    #[tokio::test]
    async fn all_sources_down_publishes_empty_snapshot() {
        let pool = crate::db::test_pool().await;
        let (down, _) = StubSource::boxed(SourceKind::FootballData, Behaviour::Fail);
        let refresher = refresher_with(pool, vec![down], Config::default());

        let status = refresher.refresh().await;
        assert_eq!(status.match_count, 0);
        assert_eq!(status.source, None);
        assert!(status.last_refresh.is_some());
    }

    #[tokio::test]
    async fn scheduler_runs_immediately_then_on_interval() {
        let pool = crate::db::test_pool().await;
        let refresher = Arc::new(refresher_with(pool, vec![Box::new(MockSource::new())], Config::default()));
        let snapshot = refresher.snapshot();

        let handle = spawn_scheduler(refresher, Duration::from_millis(50));
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while snapshot.read().await.refresh_count < 2 {
            assert!(tokio::time::Instant::now() < deadline, "scheduler never ticked twice");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
    }
}
