use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::{
    clear_cache, count_cached, create_pool, get_cached_matches, init_database_with_pool,
};
use crate::models::{MatchRecord, Snapshot, StatusReport};
use crate::services::{placeholder_lineup, predictor_for, Refresher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// One flattened cache record, the shape of a CSV row.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    home_team: &'a str,
    away_team: &'a str,
    competition: &'a str,
    kickoff: String,
    source: &'static str,
    predicted_score: Option<String>,
    home_possession: Option<u8>,
    away_possession: Option<u8>,
    home_shots: Option<u8>,
    away_shots: Option<u8>,
    corners: Option<u8>,
    cards: Option<u8>,
}

impl<'a> From<&'a MatchRecord> for ExportRow<'a> {
    fn from(record: &'a MatchRecord) -> Self {
        let p = record.prediction.as_ref();
        Self {
            home_team: &record.home_team,
            away_team: &record.away_team,
            competition: &record.competition,
            kickoff: record.kickoff.to_rfc3339(),
            source: record.source.label(),
            predicted_score: p.map(|p| p.score_line()),
            home_possession: p.map(|p| p.home_possession),
            away_possession: p.map(|p| p.away_possession),
            home_shots: p.map(|p| p.home_shots),
            away_shots: p.map(|p| p.away_shots),
            corners: p.map(|p| p.corners),
            cards: p.map(|p| p.cards),
        }
    }
}

pub async fn refresh_once(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    let snapshot = Arc::new(RwLock::new(Snapshot::default()));
    let refresher = Refresher::from_config(pool, config.clone(), snapshot.clone())?;

    println!("🔄 Running one refresh cycle...");
    let status = refresher.refresh().await;

    println!("{}", refresh_summary(&status));
    if status.match_count == 0 {
        return Ok(());
    }

    let snapshot = snapshot.read().await;
    for (i, record) in snapshot.matches.iter().enumerate() {
        print_match(i + 1, record, &config);
    }

    Ok(())
}

fn refresh_summary(status: &StatusReport) -> String {
    if status.match_count == 0 {
        return "📭 Every source came back empty. Nothing to show.".to_string();
    }
    match status.source {
        Some(source) => format!("✅ {} matches from {}", status.match_count, source),
        None => format!("✅ {} manual matches (every source came back empty)", status.match_count),
    }
}

pub fn predict(config: &Config, home: &str, away: &str) -> Result<()> {
    for name in [home, away] {
        if !crate::utils::validate_team_name(name) {
            anyhow::bail!("Team names must be 1-100 characters");
        }
    }

    let predictor = predictor_for(config.predictor);
    let p = predictor.predict(home, away);

    println!("🔮 {} vs {} ({} model)", home, away, p.model);
    println!("   Score:        {}", p.score_line());
    println!("   Possession:   {}% - {}%", p.home_possession, p.away_possession);
    println!("   Shots:        {} - {}", p.home_shots, p.away_shots);
    println!("   On target:    {} - {}", p.home_shots_on_target, p.away_shots_on_target);
    println!("   Fouls:        {} - {}", p.home_fouls, p.away_fouls);
    println!("   Corners:      {}", p.corners);
    println!("   Cards:        {}", p.cards);

    if config.placeholder_lineups {
        println!("\n📋 {}: {}", home, placeholder_lineup(home).join(", "));
        println!("📋 {}: {}", away, placeholder_lineup(away).join(", "));
    }

    Ok(())
}

pub async fn show_cache(config: &Config, clear: bool) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    if clear {
        let removed = clear_cache(&pool).await?;
        println!("🧹 Removed {} cached matches", removed);
        return Ok(());
    }

    let total = count_cached(&pool).await?;
    println!("💾 {} matches cached (capacity {})", total, config.cache_capacity);

    let records = get_cached_matches(&pool, config.cache_read_limit()).await?;
    for (i, record) in records.iter().enumerate() {
        print_match(i + 1, record, config);
    }

    Ok(())
}

pub async fn export(config: &Config, format: ExportFormat, out: Option<&Path>) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    let records = get_cached_matches(&pool, config.cache_capacity).await?;
    if records.is_empty() {
        println!("📭 Cache is empty. Run `matchcast refresh` first.");
        return Ok(());
    }

    let writer: Box<dyn Write> = match out {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    write_records(&records, format, writer)?;

    if let Some(path) = out {
        println!("✅ Exported {} matches to {}", records.len(), path.display());
    }

    Ok(())
}

fn write_records<W: Write>(
    records: &[MatchRecord],
    format: ExportFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for record in records {
                csv_writer.serialize(ExportRow::from(record))?;
            }
            csv_writer.flush()?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn print_match(index: usize, record: &MatchRecord, config: &Config) {
    let kickoff = record.kickoff.with_timezone(&config.display_offset);
    println!(
        "{}. {} vs {} ({}) {}",
        index,
        record.home_team,
        record.away_team,
        record.competition,
        kickoff.format("%d/%m %H:%M")
    );
    if let Some(p) = &record.prediction {
        println!(
            "   🎯 {} | possession {}-{} | shots {}-{}",
            p.score_line(),
            p.home_possession,
            p.away_possession,
            p.home_shots,
            p.away_shots
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictorKind;
    use crate::models::SourceKind;
    use chrono::{TimeZone, Utc};

    fn records() -> Vec<MatchRecord> {
        let kickoff = Utc.with_ymd_and_hms(2025, 8, 15, 18, 0, 0).unwrap();
        let mut with_prediction = MatchRecord::new("Ajax", "PSV", "Eredivisie", kickoff, SourceKind::FootballData);
        with_prediction.prediction = Some(predictor_for(PredictorKind::NameHash).predict("Ajax", "PSV"));
        vec![
            with_prediction,
            MatchRecord::new("Celtic", "Rangers, FC", "Premiership", kickoff, SourceKind::Flashscore),
        ]
    }

    #[test]
    fn csv_export_has_header_and_one_row_per_match() {
        let mut out = Vec::new();
        write_records(&records(), ExportFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("home_team,away_team,competition,kickoff,source,predicted_score"));
        assert!(lines[1].starts_with("Ajax,PSV,Eredivisie,2025-08-15T18:00:00+00:00,football-data.org,"));
        // Embedded commas are quoted
        assert!(lines[2].contains("\"Rangers, FC\""));
    }

    #[test]
    fn json_export_round_trips_records() {
        let mut out = Vec::new();
        write_records(&records(), ExportFormat::Json, &mut out).unwrap();
        let parsed: Vec<MatchRecord> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, records());
    }

    #[test]
    fn summary_counts_manual_matches_without_a_source() {
        let status = StatusReport { match_count: 2, source: None, last_refresh: None, refresh_count: 1 };
        assert!(refresh_summary(&status).contains("2 manual matches"));

        let empty = StatusReport { match_count: 0, ..status.clone() };
        assert!(refresh_summary(&empty).contains("Nothing to show"));

        let live = StatusReport { source: Some(SourceKind::Flashscore), ..status };
        assert_eq!(refresh_summary(&live), "✅ 2 matches from Flashscore");
    }

    #[test]
    fn predict_rejects_blank_names() {
        assert!(predict(&Config::default(), "  ", "Chelsea").is_err());
        assert!(predict(&Config::default(), "Arsenal", "Chelsea").is_ok());
    }
}
