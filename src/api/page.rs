use axum::{extract::State, response::Html};
use chrono::{FixedOffset, NaiveDate};
use std::fmt::Write;

use crate::models::{MatchRecord, Snapshot};
use crate::utils::{day_label, escape_html, today_in};

use super::AppState;

// GET / - server-rendered match list
pub(super) async fn index(State(state): State<AppState>) -> Html<String> {
    let offset = state.config.display_offset;
    let snapshot = state.snapshot.read().await;
    Html(render_page(&snapshot, &offset, today_in(&offset)))
}

/// Render the snapshot as a self-contained HTML page. Every team and
/// competition name is escaped.
pub fn render_page(snapshot: &Snapshot, offset: &FixedOffset, today: NaiveDate) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Matchcast</title>\n<style>\n\
         body{font-family:sans-serif;margin:0 auto;max-width:56rem;padding:1rem;background:#f4f6f8}\n\
         .match{background:#fff;border-radius:8px;padding:1rem;margin:0 0 1rem;box-shadow:0 1px 3px #0002}\n\
         .teams{font-size:1.2rem;font-weight:bold}\n\
         .meta{color:#667;font-size:.9rem}\n\
         table{border-collapse:collapse;margin-top:.5rem}td{padding:.1rem .6rem}\n\
         .lineups{display:flex;gap:2rem;font-size:.85rem}\n\
         </style>\n</head>\n<body>\n<h1>Matchcast</h1>\n",
    );

    let updated = snapshot
        .refreshed_at
        .map(|t| t.with_timezone(offset).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    let source = snapshot.source.map_or("none", |s| s.label());
    let _ = writeln!(
        html,
        "<p class=\"meta\">Last updated: {} &middot; Source: {}</p>",
        escape_html(&updated),
        escape_html(source)
    );

    if snapshot.matches.is_empty() {
        html.push_str("<p class=\"empty\">No matches available right now. Check back later.</p>\n");
    }

    for record in &snapshot.matches {
        render_match(&mut html, record, offset, today);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_match(html: &mut String, record: &MatchRecord, offset: &FixedOffset, today: NaiveDate) {
    let home = escape_html(&record.home_team);
    let away = escape_html(&record.away_team);

    html.push_str("<div class=\"match\">\n");
    let _ = writeln!(html, "<div class=\"teams\">{} vs {}</div>", home, away);
    let _ = writeln!(
        html,
        "<div class=\"meta\">{} &middot; {} {}</div>",
        escape_html(&record.competition),
        day_label(record.kickoff, today, offset),
        record.kickoff.with_timezone(offset).format("%H:%M")
    );

    if let Some(p) = &record.prediction {
        let _ = writeln!(
            html,
            "<div class=\"prediction\">Predicted score: <strong>{}</strong></div>",
            p.score_line()
        );
        html.push_str("<table>\n");
        let _ = writeln!(html, "<tr><td></td><td>{}</td><td>{}</td></tr>", home, away);
        let rows = [
            ("Possession %", p.home_possession, p.away_possession),
            ("Shots", p.home_shots, p.away_shots),
            ("On target", p.home_shots_on_target, p.away_shots_on_target),
            ("Fouls", p.home_fouls, p.away_fouls),
        ];
        for (label, h, a) in rows {
            let _ = writeln!(html, "<tr><td>{}</td><td>{}</td><td>{}</td></tr>", label, h, a);
        }
        let _ = writeln!(html, "<tr><td>Corners</td><td colspan=\"2\">{}</td></tr>", p.corners);
        let _ = writeln!(html, "<tr><td>Cards</td><td colspan=\"2\">{}</td></tr>", p.cards);
        html.push_str("</table>\n");
    }

    if !record.lineup_home.is_empty() || !record.lineup_away.is_empty() {
        html.push_str("<div class=\"lineups\">\n");
        for (team, lineup) in [(&home, &record.lineup_home), (&away, &record.lineup_away)] {
            let _ = write!(html, "<div><strong>{}</strong><ol>", team);
            for player in lineup {
                let _ = write!(html, "<li>{}</li>", escape_html(player));
            }
            html.push_str("</ol></div>\n");
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n");
}
