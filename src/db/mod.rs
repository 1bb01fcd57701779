use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::str::FromStr;

use crate::models::{ManualMatch, ManualMatchInput, MatchRecord};

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(database_url: &str) -> Result<()> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await
}

/// Called from the server so schema creation shares the main pool.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    // One row per composite key; the record itself is opaque JSON
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_cache (
            cache_key TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            cached_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manual_matches (
            id TEXT PRIMARY KEY,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            competition TEXT NOT NULL,
            kickoff TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_match_cache_cached_at ON match_cache(cached_at)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

// Cache operations

/// Insert-or-replace each record under its composite key, then prune to `capacity`.
pub async fn cache_matches(
    pool: &SqlitePool,
    records: &[MatchRecord],
    offset: &FixedOffset,
    capacity: usize,
) -> Result<usize> {
    let now = Utc::now().timestamp_millis();

    for record in records {
        sqlx::query(
            "INSERT OR REPLACE INTO match_cache (cache_key, data, cached_at) VALUES (?, ?, ?)",
        )
        .bind(record.cache_key(offset))
        .bind(serde_json::to_string(record)?)
        .bind(now)
        .execute(pool)
        .await?;
    }

    let pruned = prune_cache(pool, capacity).await?;
    if pruned > 0 {
        tracing::debug!("Pruned {} stale cache entries", pruned);
    }

    Ok(records.len())
}

/// Keep only the `capacity` most recent entries.
pub async fn prune_cache(pool: &SqlitePool, capacity: usize) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM match_cache WHERE cache_key NOT IN (
            SELECT cache_key FROM match_cache ORDER BY cached_at DESC, rowid DESC LIMIT ?
        )
        "#,
    )
    .bind(capacity as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Most recently cached records first. Rows that no longer decode are skipped.
pub async fn get_cached_matches(pool: &SqlitePool, limit: usize) -> Result<Vec<MatchRecord>> {
    let rows = sqlx::query(
        "SELECT cache_key, data FROM match_cache ORDER BY cached_at DESC, rowid DESC LIMIT ?",
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(decode_cached(rows))
}

/// Like `get_cached_matches`, restricted to entries whose key date is one of `days`.
pub async fn get_cached_matches_on(
    pool: &SqlitePool,
    days: &[NaiveDate],
    limit: usize,
) -> Result<Vec<MatchRecord>> {
    if days.is_empty() {
        return Ok(Vec::new());
    }

    // The key ends with the display-zone date, `..._YYYY-MM-DD`
    let placeholders = vec!["?"; days.len()].join(", ");
    let sql = format!(
        "SELECT cache_key, data FROM match_cache WHERE substr(cache_key, -10) IN ({}) \
         ORDER BY cached_at DESC, rowid DESC LIMIT ?",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for day in days {
        query = query.bind(day.format("%Y-%m-%d").to_string());
    }
    let rows = query.bind(limit as i64).fetch_all(pool).await?;

    Ok(decode_cached(rows))
}

fn decode_cached(rows: Vec<sqlx::sqlite::SqliteRow>) -> Vec<MatchRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let data: String = row.get("data");
        match serde_json::from_str::<MatchRecord>(&data) {
            Ok(record) => records.push(record),
            Err(e) => {
                let key: String = row.get("cache_key");
                tracing::warn!("Skipping undecodable cache entry '{}': {}", key, e);
            }
        }
    }
    records
}

pub async fn count_cached(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM match_cache")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn clear_cache(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM match_cache").execute(pool).await?;
    tracing::info!("Match cache cleared");
    Ok(result.rows_affected())
}

// Manual match operations

pub async fn insert_manual_match(
    pool: &SqlitePool,
    input: &ManualMatchInput,
) -> Result<ManualMatch> {
    let now = Utc::now();
    let manual = ManualMatch {
        id: uuid::Uuid::new_v4().to_string(),
        home_team: input.home_team.trim().to_string(),
        away_team: input.away_team.trim().to_string(),
        competition: input.competition.trim().to_string(),
        kickoff: input.kickoff,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO manual_matches
        (id, home_team, away_team, competition, kickoff, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&manual.id)
    .bind(&manual.home_team)
    .bind(&manual.away_team)
    .bind(&manual.competition)
    .bind(manual.kickoff.to_rfc3339())
    .bind(manual.created_at.to_rfc3339())
    .bind(manual.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(manual)
}

pub async fn list_manual_matches(pool: &SqlitePool) -> Result<Vec<ManualMatch>> {
    let rows = sqlx::query("SELECT * FROM manual_matches ORDER BY kickoff ASC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(manual_from_row).collect()
}

pub async fn get_manual_match(pool: &SqlitePool, id: &str) -> Result<Option<ManualMatch>> {
    let row = sqlx::query("SELECT * FROM manual_matches WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(manual_from_row).transpose()
}

pub async fn update_manual_match(
    pool: &SqlitePool,
    id: &str,
    input: &ManualMatchInput,
) -> Result<Option<ManualMatch>> {
    let result = sqlx::query(
        r#"
        UPDATE manual_matches
        SET home_team = ?, away_team = ?, competition = ?, kickoff = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(input.home_team.trim())
    .bind(input.away_team.trim())
    .bind(input.competition.trim())
    .bind(input.kickoff.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_manual_match(pool, id).await
}

pub async fn delete_manual_match(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM manual_matches WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn manual_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ManualMatch> {
    Ok(ManualMatch {
        id: row.get("id"),
        home_team: row.get("home_team"),
        away_team: row.get("away_team"),
        competition: row.get("competition"),
        kickoff: parse_timestamp(&row.get::<String, _>("kickoff"))?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_database_with_pool(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use chrono::{Offset, TimeZone};

    fn record(home: &str, away: &str, day: u32, competition: &str) -> MatchRecord {
        let kickoff = Utc.with_ymd_and_hms(2025, 8, day, 18, 0, 0).unwrap();
        MatchRecord::new(home, away, competition, kickoff, SourceKind::FootballData)
    }

    #[tokio::test]
    async fn cache_key_collision_overwrites() {
        let pool = test_pool().await;
        let utc = Utc.fix();

        cache_matches(&pool, &[record("Arsenal", "Chelsea", 15, "Premier League")], &utc, 10)
            .await
            .unwrap();
        cache_matches(&pool, &[record("Arsenal", "Chelsea", 15, "FA Cup")], &utc, 10)
            .await
            .unwrap();

        assert_eq!(count_cached(&pool).await.unwrap(), 1);
        let cached = get_cached_matches(&pool, 10).await.unwrap();
        assert_eq!(cached[0].competition, "FA Cup");
    }

    #[tokio::test]
    async fn different_dates_are_distinct_entries() {
        let pool = test_pool().await;
        let utc = Utc.fix();

        let records = vec![
            record("Arsenal", "Chelsea", 15, "Premier League"),
            record("Arsenal", "Chelsea", 16, "Premier League"),
        ];
        cache_matches(&pool, &records, &utc, 10).await.unwrap();

        assert_eq!(count_cached(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn prune_keeps_most_recent() {
        let pool = test_pool().await;
        let utc = Utc.fix();

        let first: Vec<_> = (1..=4).map(|d| record("Old", "Side", d, "L")).collect();
        cache_matches(&pool, &first, &utc, 100).await.unwrap();
        let second: Vec<_> = (10..=12).map(|d| record("New", "Side", d, "L")).collect();
        cache_matches(&pool, &second, &utc, 3).await.unwrap();

        assert_eq!(count_cached(&pool).await.unwrap(), 3);
        let cached = get_cached_matches(&pool, 10).await.unwrap();
        assert!(cached.iter().all(|r| r.home_team == "New"));
    }

    #[tokio::test]
    async fn read_limit_is_respected() {
        let pool = test_pool().await;
        let utc = Utc.fix();

        let records: Vec<_> = (1..=6).map(|d| record("A", "B", d, "L")).collect();
        cache_matches(&pool, &records, &utc, 100).await.unwrap();

        assert_eq!(get_cached_matches(&pool, 4).await.unwrap().len(), 4);
        assert_eq!(clear_cache(&pool).await.unwrap(), 6);
        assert!(get_cached_matches(&pool, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn day_filter_skips_other_dates() {
        let pool = test_pool().await;
        let utc = Utc.fix();

        let records: Vec<_> = (14..=17).map(|d| record("A", "B", d, "L")).collect();
        cache_matches(&pool, &records, &utc, 100).await.unwrap();

        let days = [
            NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 16).unwrap(),
        ];
        let cached = get_cached_matches_on(&pool, &days, 10).await.unwrap();

        assert_eq!(cached.len(), 2);
        assert!(cached.iter().all(|r| days.contains(&r.kickoff.date_naive())));
        assert_eq!(get_cached_matches_on(&pool, &days, 1).await.unwrap().len(), 1);
        assert!(get_cached_matches_on(&pool, &[], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn manual_match_crud() {
        let pool = test_pool().await;
        let input = ManualMatchInput {
            home_team: " Palmeiras ".to_string(),
            away_team: "Corinthians".to_string(),
            competition: "Paulistao".to_string(),
            kickoff: Utc.with_ymd_and_hms(2025, 8, 15, 22, 0, 0).unwrap(),
        };

        let created = insert_manual_match(&pool, &input).await.unwrap();
        assert_eq!(created.home_team, "Palmeiras");
        assert_eq!(list_manual_matches(&pool).await.unwrap().len(), 1);

        let changed = ManualMatchInput { competition: "Brasileirao".to_string(), ..input };
        let updated = update_manual_match(&pool, &created.id, &changed).await.unwrap().unwrap();
        assert_eq!(updated.competition, "Brasileirao");
        assert_eq!(updated.created_at, created.created_at);

        assert!(update_manual_match(&pool, "missing", &changed).await.unwrap().is_none());
        assert!(delete_manual_match(&pool, &created.id).await.unwrap());
        assert!(!delete_manual_match(&pool, &created.id).await.unwrap());
        assert!(get_manual_match(&pool, &created.id).await.unwrap().is_none());
    }
}
