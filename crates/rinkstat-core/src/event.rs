//! Raw game events, the read-only input of the engine.
//!
//! Events are produced by an upstream ingestion pipeline and are never
//! written here. A [`Population`] is the slice of events belonging to the
//! games selected by a [`crate::scope::GameFilter`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub type HumanId = i64;
pub type GameId = i64;
pub type TeamId = i64;

/// Fixed minutes charged for a game misconduct, whatever the recorded value.
pub const GAME_MISCONDUCT_MINUTES: u32 = 10;

// ─── People ──────────────────────────────────────────────────────────────────

/// A first/middle/last name triple, used to look up placeholder humans and
/// the sentinel anchor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonName {
  pub first:  String,
  #[serde(default)]
  pub middle: String,
  pub last:   String,
}

impl PersonName {
  pub fn new(first: &str, middle: &str, last: &str) -> Self {
    Self {
      first:  first.to_owned(),
      middle: middle.to_owned(),
      last:   last.to_owned(),
    }
  }
}

impl fmt::Display for PersonName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.middle.is_empty() {
      write!(f, "{} {}", self.first, self.last)
    } else {
      write!(f, "{} {} {}", self.first, self.middle, self.last)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Human {
  pub human_id: HumanId,
  pub name:     PersonName,
}

// ─── Games ───────────────────────────────────────────────────────────────────

/// Shots on goal for one team, per period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodShots {
  pub period_1: u32,
  pub period_2: u32,
  pub period_3: u32,
  pub overtime: u32,
  pub shootout: u32,
}

impl PeriodShots {
  pub fn total(&self) -> u32 {
    self.period_1 + self.period_2 + self.period_3 + self.overtime + self.shootout
  }
}

/// One side of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLine {
  pub team_id:     TeamId,
  pub final_score: Option<u32>,
  pub shots:       PeriodShots,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
  pub game_id:        GameId,
  pub org_id:         i64,
  pub division_id:    i64,
  /// Level of the game's division, if the division has one.
  pub level_id:       Option<i64>,
  pub date:           NaiveDate,
  pub time:           NaiveTime,
  pub status:         String,
  pub home:           TeamLine,
  pub visitor:        TeamLine,
  pub referee_1_id:   Option<HumanId>,
  pub referee_2_id:   Option<HumanId>,
  pub scorekeeper_id: Option<HumanId>,
}

impl Game {
  pub fn starts_at(&self) -> NaiveDateTime { self.date.and_time(self.time) }

  /// Only final games (`Final`, `Final(SO)`, ...) are eligible for stats.
  pub fn is_final(&self) -> bool { self.status.starts_with("Final") }

  /// The side opposing `team_id`. Anything that is not the home team is
  /// treated as the visitor.
  pub fn opponent_of(&self, team_id: TeamId) -> &TeamLine {
    if team_id == self.home.team_id {
      &self.visitor
    } else {
      &self.home
    }
  }

  /// Distinct referees assigned to the game (zero, one or two).
  pub fn referees(&self) -> Vec<HumanId> {
    let mut refs = Vec::with_capacity(2);
    for id in [self.referee_1_id, self.referee_2_id].into_iter().flatten() {
      if !refs.contains(&id) {
        refs.push(id);
      }
    }
    refs
  }
}

// ─── Per-game events ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
  pub game_id:  GameId,
  pub human_id: HumanId,
  pub team_id:  TeamId,
  /// Free-form role code; `G` (any case) marks a goalie.
  pub role:     String,
}

impl RosterEntry {
  pub fn is_goalie(&self) -> bool { self.role.eq_ignore_ascii_case("g") }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
  pub goal_id:     i64,
  pub game_id:     GameId,
  pub scorer_id:   Option<HumanId>,
  pub assist_1_id: Option<HumanId>,
  pub assist_2_id: Option<HumanId>,
}

impl Goal {
  pub fn assisters(&self) -> impl Iterator<Item = HumanId> + '_ {
    [self.assist_1_id, self.assist_2_id].into_iter().flatten()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
  pub penalty_id:      i64,
  pub game_id:         GameId,
  pub penalized_id:    Option<HumanId>,
  /// Raw minutes code as recorded: a number, `GM`, or blank.
  pub penalty_minutes: Option<String>,
}

impl Penalty {
  pub fn minutes(&self) -> PenaltyMinutes {
    PenaltyMinutes::parse(self.penalty_minutes.as_deref())
  }

  pub fn is_game_misconduct(&self) -> bool {
    matches!(self.minutes(), PenaltyMinutes::GameMisconduct)
  }
}

/// The interpreted value of a penalty's minutes code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PenaltyMinutes {
  Minutes(u32),
  GameMisconduct,
  /// The code was neither blank, `GM`, nor a non-negative integer.
  Unparseable(String),
}

impl PenaltyMinutes {
  pub fn parse(raw: Option<&str>) -> Self {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
      return Self::Minutes(0);
    }
    if raw.eq_ignore_ascii_case("gm") {
      return Self::GameMisconduct;
    }
    match raw.parse::<u32>() {
      Ok(minutes) => Self::Minutes(minutes),
      Err(_) => Self::Unparseable(raw.to_owned()),
    }
  }

  /// Minutes contributed to a penalty-minutes total. Unparseable codes
  /// contribute nothing; callers log them.
  pub fn contribution(&self) -> u32 {
    match self {
      Self::Minutes(minutes) => *minutes,
      Self::GameMisconduct => GAME_MISCONDUCT_MINUTES,
      Self::Unparseable(_) => 0,
    }
  }
}

/// A goalie's save record for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalieSaves {
  pub game_id:       GameId,
  pub goalie_id:     HumanId,
  pub goals_allowed: u32,
  pub shots_against: u32,
  pub saves_count:   u32,
}

// ─── Population ──────────────────────────────────────────────────────────────

/// Every event attached to a set of eligible games.
#[derive(Debug, Clone, Default)]
pub struct Population {
  pub games:     Vec<Game>,
  pub roster:    Vec<RosterEntry>,
  pub goals:     Vec<Goal>,
  pub penalties: Vec<Penalty>,
  pub saves:     Vec<GoalieSaves>,
}

impl Population {
  pub fn is_empty(&self) -> bool { self.games.is_empty() }

  pub fn latest_start(&self) -> Option<NaiveDateTime> {
    self.games.iter().map(Game::starts_at).max()
  }
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case(Some("2"), PenaltyMinutes::Minutes(2))]
  #[case(Some(" 5 "), PenaltyMinutes::Minutes(5))]
  #[case(Some("GM"), PenaltyMinutes::GameMisconduct)]
  #[case(Some("gm"), PenaltyMinutes::GameMisconduct)]
  #[case(Some(""), PenaltyMinutes::Minutes(0))]
  #[case(None, PenaltyMinutes::Minutes(0))]
  #[case(Some("2+10"), PenaltyMinutes::Unparseable("2+10".into()))]
  fn parses_penalty_minutes(
    #[case] raw: Option<&str>,
    #[case] expected: PenaltyMinutes,
  ) {
    assert_eq!(PenaltyMinutes::parse(raw), expected);
  }

  #[test]
  fn game_misconduct_contributes_fixed_minutes() {
    assert_eq!(PenaltyMinutes::GameMisconduct.contribution(), 10);
    assert_eq!(PenaltyMinutes::Unparseable("x".into()).contribution(), 0);
  }

  #[test]
  fn roster_goalie_role_is_case_insensitive() {
    let mut entry = RosterEntry { game_id: 1, human_id: 1, team_id: 1, role: "g".into() };
    assert!(entry.is_goalie());
    entry.role = "C".into();
    assert!(!entry.is_goalie());
  }

  #[test]
  fn referees_are_deduplicated() {
    let game = Game {
      game_id:        1,
      org_id:         1,
      division_id:    1,
      level_id:       None,
      date:           NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
      time:           NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
      status:         "Final".into(),
      home:           TeamLine::default(),
      visitor:        TeamLine::default(),
      referee_1_id:   Some(7),
      referee_2_id:   Some(7),
      scorekeeper_id: None,
    };
    assert_eq!(game.referees(), vec![7]);
  }
}
