//! Scraper for the Flashscore front page.
//!
//! The page groups fixtures into one `div#g_1_<YYYYMMDD>` section per day.
//! Inside a section, `div.event__titleBox` headers name the competition for
//! the `div.event__match` rows that follow them.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::{check_status, http_client, FetchWindow, MatchSource, SourceError};
use crate::models::{MatchRecord, SourceKind};
use crate::utils::{local_to_utc, parse_hhmm};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub struct FlashscoreSource {
    client: Client,
    url: String,
}

impl FlashscoreSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout, BROWSER_USER_AGENT)?,
            url,
        })
    }
}

#[async_trait]
impl MatchSource for FlashscoreSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Flashscore
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError> {
        tracing::info!("Scraping {}…", self.url);
        let response = self.client.get(&self.url).send().await?;
        let html = check_status(response).await?.text().await?;
        parse_page(&html, window)
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|_| SourceError::Parse(format!("invalid selector '{}'", css)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(element_text).filter(|t| !t.is_empty())
}

/// Parse the day sections for today and tomorrow, at most `per_day` rows each.
pub fn parse_page(html: &str, window: &FetchWindow) -> Result<Vec<MatchRecord>, SourceError> {
    let document = Html::parse_document(html);
    let rows = selector("div.event__titleBox, div.event__match")?;
    let home_sel = selector(".event__participant--home")?;
    let away_sel = selector(".event__participant--away")?;
    let time_sel = selector(".event__time")?;

    let mut records = Vec::new();

    for day in window.days() {
        let section_sel = selector(&format!("div#g_1_{}", day.format("%Y%m%d")))?;
        let Some(section) = document.select(&section_sel).next() else {
            tracing::debug!("No Flashscore section for {}", day);
            continue;
        };

        let mut competition = String::from("Unknown");
        let mut taken = 0usize;

        for row in section.select(&rows) {
            if row.value().classes().any(|c| c == "event__titleBox") {
                competition = element_text(row);
                continue;
            }
            if taken >= window.per_day {
                break;
            }
            match parse_row(row, day, &competition, window, &home_sel, &away_sel, &time_sel) {
                Some(record) => {
                    records.push(record);
                    taken += 1;
                }
                None => tracing::warn!("Skipping unreadable Flashscore row on {}", day),
            }
        }
    }

    Ok(records)
}

fn parse_row(
    row: ElementRef<'_>,
    day: NaiveDate,
    competition: &str,
    window: &FetchWindow,
    home_sel: &Selector,
    away_sel: &Selector,
    time_sel: &Selector,
) -> Option<MatchRecord> {
    let home = first_text(row, home_sel)?;
    let away = first_text(row, away_sel)?;
    let time = parse_hhmm(&first_text(row, time_sel)?)?;
    let kickoff = local_to_utc(day, time, &window.offset)?;
    Some(MatchRecord::new(home, away, competition, kickoff, SourceKind::Flashscore))
}
