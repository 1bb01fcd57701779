//! Placeholder match "predictions".
//!
//! Both strategies derive numbers from the team names alone. Nothing here is
//! a statistical model; the output only has to look plausible and stay within
//! the clamped ranges below.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::PredictorKind;
use crate::models::Prediction;
use crate::utils::{char_code_sum, stable_seed};

pub const MAX_HOME_GOALS: u8 = 5;
pub const MAX_AWAY_GOALS: u8 = 4;
pub const MIN_POSSESSION: u8 = 35;
pub const MAX_POSSESSION: u8 = 65;
pub const MAX_SHOTS: u8 = 30;
pub const MIN_FOULS: u8 = 5;
pub const MAX_FOULS: u8 = 25;
pub const MAX_CORNERS: u8 = 20;
pub const MAX_CARDS: u8 = 10;

const LINEUP_POSITIONS: [&str; 11] = [
    "GK", "DF", "DF", "DF", "DF", "MF", "MF", "MF", "FW", "FW", "FW",
];

/// Pure function of (home, away) to a stats bag.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &'static str;

    fn predict(&self, home: &str, away: &str) -> Prediction;
}

pub fn predictor_for(kind: PredictorKind) -> Box<dyn Predictor> {
    match kind {
        PredictorKind::NameHash => Box::new(NameHashPredictor),
        PredictorKind::Seeded => Box::new(SeededPredictor),
    }
}

/// Unclamped numbers as a strategy computes them.
#[derive(Debug, Clone, Copy, Default)]
struct RawStats {
    home_goals: i32,
    away_goals: i32,
    home_possession: i32,
    home_shots: i32,
    away_shots: i32,
    home_shots_on_target: i32,
    away_shots_on_target: i32,
    home_fouls: i32,
    away_fouls: i32,
    corners: i32,
    cards: i32,
}

fn bounded(value: i32, min: u8, max: u8) -> u8 {
    value.clamp(i32::from(min), i32::from(max)) as u8
}

impl RawStats {
    fn clamp(self, model: &str) -> Prediction {
        let home_possession = bounded(self.home_possession, MIN_POSSESSION, MAX_POSSESSION);
        let home_shots = bounded(self.home_shots, 1, MAX_SHOTS);
        let away_shots = bounded(self.away_shots, 1, MAX_SHOTS);

        Prediction {
            model: model.to_string(),
            home_goals: bounded(self.home_goals, 0, MAX_HOME_GOALS),
            away_goals: bounded(self.away_goals, 0, MAX_AWAY_GOALS),
            home_possession,
            away_possession: 100 - home_possession,
            home_shots,
            away_shots,
            home_shots_on_target: bounded(self.home_shots_on_target, 1, home_shots),
            away_shots_on_target: bounded(self.away_shots_on_target, 1, away_shots),
            home_fouls: bounded(self.home_fouls, MIN_FOULS, MAX_FOULS),
            away_fouls: bounded(self.away_fouls, MIN_FOULS, MAX_FOULS),
            corners: bounded(self.corners, 0, MAX_CORNERS),
            cards: bounded(self.cards, 0, MAX_CARDS),
        }
    }
}

/// Character-code sums and name lengths only; no randomness at all.
pub struct NameHashPredictor;

impl Predictor for NameHashPredictor {
    fn name(&self) -> &'static str {
        "name_hash"
    }

    fn predict(&self, home: &str, away: &str) -> Prediction {
        let home_factor = (char_code_sum(home) % 10) as i32;
        let away_factor = (char_code_sum(away) % 8) as i32;
        let home_len = (home.chars().count() % 10) as i32;
        let away_len = (away.chars().count() % 8) as i32;

        let home_shots = 8 + home_len;
        let away_shots = 6 + away_len;

        RawStats {
            home_goals: (home_factor + 3) / away_factor.max(1),
            away_goals: (away_factor + 2) / home_factor.max(1),
            home_possession: 45 + home_len,
            home_shots,
            away_shots,
            home_shots_on_target: home_shots * 4 / 10,
            away_shots_on_target: away_shots * 3 / 10,
            home_fouls: 8 + home_len % 5,
            away_fouls: 7 + away_len % 5,
            corners: 8 + (home_factor + away_factor) / 2,
            cards: 4 + (home_factor + away_factor) / 4,
        }
        .clamp(self.name())
    }
}

/// Random draws, seeded from both names so the same fixture always gets the same numbers.
pub struct SeededPredictor;

impl Predictor for SeededPredictor {
    fn name(&self) -> &'static str {
        "seeded"
    }

    fn predict(&self, home: &str, away: &str) -> Prediction {
        let mut rng = StdRng::seed_from_u64(stable_seed(home, away));
        let home_factor = (char_code_sum(home) % 10) as i32;
        let away_factor = (char_code_sum(away) % 10) as i32;

        let home_shots = rng.random_range(8..=18) + home_factor;
        let away_shots = rng.random_range(6..=16) + away_factor;

        RawStats {
            home_goals: rng.random_range(0..=3) + home_factor - away_factor,
            away_goals: rng.random_range(0..=2) + away_factor - home_factor,
            home_possession: 45 + home_factor * 2,
            home_shots,
            away_shots,
            home_shots_on_target: home_shots / 3 + home_factor - 2,
            away_shots_on_target: away_shots / 3 + away_factor - 2,
            home_fouls: rng.random_range(10..=20),
            away_fouls: rng.random_range(10..=20),
            corners: rng.random_range(4..=12) + (home_factor + away_factor) / 2,
            cards: rng.random_range(2..=6) + (home_factor + away_factor) / 4,
        }
        .clamp(self.name())
    }
}

/// 4-3-3 of numbered placeholder players named after the club's first word.
pub fn placeholder_lineup(team: &str) -> Vec<String> {
    let prefix = team.split_whitespace().next().unwrap_or(team);
    LINEUP_POSITIONS
        .iter()
        .enumerate()
        .map(|(i, pos)| format!("{} {} Player {}", pos, prefix, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 12] = [
        "Manchester United",
        "Liverpool",
        "Real Madrid",
        "PSG",
        "Atlético Mineiro",
        "1. FC Köln",
        "Al-Ahly",
        "Borussia Mönchengladbach",
        "",
        "X",
        "Olympique Lyonnais",
        "São Paulo",
    ];

    fn assert_in_range(p: &Prediction) {
        assert!(p.home_goals <= MAX_HOME_GOALS, "{:?}", p);
        assert!(p.away_goals <= MAX_AWAY_GOALS, "{:?}", p);
        assert!((MIN_POSSESSION..=MAX_POSSESSION).contains(&p.home_possession), "{:?}", p);
        assert_eq!(u16::from(p.home_possession) + u16::from(p.away_possession), 100);
        assert!((1..=MAX_SHOTS).contains(&p.home_shots), "{:?}", p);
        assert!((1..=MAX_SHOTS).contains(&p.away_shots), "{:?}", p);
        assert!((1..=p.home_shots).contains(&p.home_shots_on_target), "{:?}", p);
        assert!((1..=p.away_shots).contains(&p.away_shots_on_target), "{:?}", p);
        assert!((MIN_FOULS..=MAX_FOULS).contains(&p.home_fouls), "{:?}", p);
        assert!((MIN_FOULS..=MAX_FOULS).contains(&p.away_fouls), "{:?}", p);
        assert!(p.corners <= MAX_CORNERS, "{:?}", p);
        assert!(p.cards <= MAX_CARDS, "{:?}", p);
    }

    #[test]
    fn every_strategy_stays_in_range() {
        for kind in [PredictorKind::NameHash, PredictorKind::Seeded] {
            let predictor = predictor_for(kind);
            for home in NAMES {
                for away in NAMES {
                    assert_in_range(&predictor.predict(home, away));
                }
            }
        }
    }

    #[test]
    fn predictions_are_deterministic() {
        for kind in [PredictorKind::NameHash, PredictorKind::Seeded] {
            let predictor = predictor_for(kind);
            assert_eq!(
                predictor.predict("Arsenal", "Chelsea"),
                predictor.predict("Arsenal", "Chelsea")
            );
        }
    }

    #[test]
    fn model_tag_names_the_strategy() {
        assert_eq!(NameHashPredictor.predict("A", "B").model, "name_hash");
        assert_eq!(SeededPredictor.predict("A", "B").model, "seeded");
    }

    #[test]
    fn clamp_pulls_extremes_into_range() {
        let raw = RawStats {
            home_goals: 40,
            away_goals: -3,
            home_possession: 99,
            home_shots: 0,
            away_shots: 90,
            home_shots_on_target: 12,
            away_shots_on_target: -1,
            home_fouls: 0,
            away_fouls: 100,
            corners: 200,
            cards: -5,
        };
        let p = raw.clamp("test");

        assert_eq!(p.home_goals, MAX_HOME_GOALS);
        assert_eq!(p.away_goals, 0);
        assert_eq!(p.home_possession, MAX_POSSESSION);
        assert_eq!(p.away_possession, 100 - MAX_POSSESSION);
        assert_eq!(p.home_shots, 1);
        assert_eq!(p.home_shots_on_target, 1);
        assert_eq!(p.away_shots, MAX_SHOTS);
        assert_eq!(p.away_shots_on_target, 1);
        assert_eq!(p.corners, MAX_CORNERS);
        assert_eq!(p.cards, 0);
    }

    #[test]
    fn lineup_is_a_433() {
        let lineup = placeholder_lineup("Real Madrid");
        assert_eq!(lineup.len(), 11);
        assert_eq!(lineup[0], "GK Real Player 1");
        assert_eq!(lineup[10], "FW Real Player 11");
        assert_eq!(placeholder_lineup("")[0], "GK  Player 1");
    }
}
