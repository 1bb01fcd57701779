use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Sum of the character codes of a team name.
pub fn char_code_sum(name: &str) -> u32 {
    name.chars().map(|c| c as u32).sum()
}

/// FNV-1a over both names. Stable across runs and toolchains, unlike `DefaultHasher`.
pub fn stable_seed(home: &str, away: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for byte in home.bytes().chain(std::iter::once(0xff)).chain(away.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Parse a scoreboard time such as `18:30`.
pub fn parse_hhmm(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

/// Today's calendar date in the given display offset.
pub fn today_in(offset: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(offset).date_naive()
}

/// Convert a local wall-clock time in `offset` to UTC.
pub fn local_to_utc(
    date: NaiveDate,
    time: NaiveTime,
    offset: &FixedOffset,
) -> Option<DateTime<Utc>> {
    date.and_time(time)
        .and_local_timezone(*offset)
        .single()
        .map(|d| d.with_timezone(&Utc))
}

/// "Today", "Tomorrow", or the display date.
pub fn day_label(kickoff: DateTime<Utc>, today: NaiveDate, offset: &FixedOffset) -> String {
    let date = kickoff.with_timezone(offset).date_naive();
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%d/%m/%Y").to_string(),
    }
}

/// Validate team name format
pub fn validate_team_name(name: &str) -> bool {
    !name.trim().is_empty() && name.len() <= 100
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
