use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{FetchWindow, MatchSource, SourceError};
use crate::db::get_cached_matches_on;
use crate::models::{MatchRecord, SourceKind};

/// Falls back to what earlier live fetches stored for today and tomorrow.
pub struct CacheSource {
    pool: SqlitePool,
    limit: usize,
}

impl CacheSource {
    pub fn new(pool: SqlitePool, limit: usize) -> Self {
        Self { pool, limit }
    }
}

#[async_trait]
impl MatchSource for CacheSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Cache
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError> {
        get_cached_matches_on(&self.pool, &window.days(), self.limit)
            .await
            .map_err(|e| SourceError::Storage(e.to_string()))
    }
}
