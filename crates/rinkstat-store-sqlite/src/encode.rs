//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Game starts are stored as separate `YYYY-MM-DD` / `HH:MM:SS` columns and
//! compared as the concatenation `date || ' ' || time`, which orders
//! lexically. Metric names are stored in their snake_case form.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rinkstat_core::{
  event::{Game, GameId, HumanId, PeriodShots, TeamId, TeamLine},
  metric::Metric,
  record::{GoalieLine, SkaterLine},
};

use crate::{Error, Result};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Dates and times ─────────────────────────────────────────────────────────

pub fn encode_dt(dt: NaiveDateTime) -> String { dt.format(DT_FMT).to_string() }

pub fn decode_dt(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, DT_FMT)
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_date(dt: NaiveDateTime) -> String { dt.format(DATE_FMT).to_string() }

pub fn encode_time(dt: NaiveDateTime) -> String { dt.format(TIME_FMT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Accepts `HH:MM:SS` and the shorter `HH:MM`.
pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FMT)
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Row creation stamp, RFC 3339 UTC.
pub fn created_at() -> String { Utc::now().to_rfc3339() }

// ─── Metric ──────────────────────────────────────────────────────────────────

pub fn encode_metric(m: Metric) -> &'static str { m.into() }

pub fn decode_metric(s: &str) -> Result<Metric> {
  Metric::from_str(s).map_err(|_| Error::UnknownMetric(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A `games` row joined with its division's level.
pub struct RawGame {
  pub game_id:             GameId,
  pub org_id:              i64,
  pub division_id:         i64,
  pub level_id:            Option<i64>,
  pub date:                String,
  pub time:                String,
  pub status:              String,
  pub home_team_id:        TeamId,
  pub visitor_team_id:     TeamId,
  pub home_final_score:    Option<u32>,
  pub visitor_final_score: Option<u32>,
  pub home_shots:          PeriodShots,
  pub visitor_shots:       PeriodShots,
  pub referee_1_id:        Option<HumanId>,
  pub referee_2_id:        Option<HumanId>,
  pub scorekeeper_id:      Option<HumanId>,
}

impl RawGame {
  pub fn into_game(self) -> Result<Game> {
    Ok(Game {
      game_id:        self.game_id,
      org_id:         self.org_id,
      division_id:    self.division_id,
      level_id:       self.level_id,
      date:           decode_date(&self.date)?,
      time:           decode_time(&self.time)?,
      status:         self.status,
      home:           TeamLine {
        team_id:     self.home_team_id,
        final_score: self.home_final_score,
        shots:       self.home_shots,
      },
      visitor:        TeamLine {
        team_id:     self.visitor_team_id,
        final_score: self.visitor_final_score,
        shots:       self.visitor_shots,
      },
      referee_1_id:   self.referee_1_id,
      referee_2_id:   self.referee_2_id,
      scorekeeper_id: self.scorekeeper_id,
    })
  }
}

/// A `game_stats_skater` row with its start still as text.
pub struct RawSkaterLine {
  pub game_id:         GameId,
  pub human_id:        HumanId,
  pub team_id:         TeamId,
  pub org_id:          i64,
  pub level_id:        Option<i64>,
  pub game_date:       String,
  pub game_time:       String,
  pub goals:           u32,
  pub assists:         u32,
  pub points:          u32,
  pub penalty_minutes: u32,
}

impl RawSkaterLine {
  pub fn into_line(self) -> Result<SkaterLine> {
    Ok(SkaterLine {
      game_id:         self.game_id,
      human_id:        self.human_id,
      team_id:         self.team_id,
      org_id:          self.org_id,
      level_id:        self.level_id,
      starts_at:       decode_date(&self.game_date)?.and_time(decode_time(&self.game_time)?),
      goals:           self.goals,
      assists:         self.assists,
      points:          self.points,
      penalty_minutes: self.penalty_minutes,
    })
  }
}

/// A `game_stats_goalie` row with its start still as text.
pub struct RawGoalieLine {
  pub game_id:         GameId,
  pub human_id:        HumanId,
  pub team_id:         TeamId,
  pub org_id:          i64,
  pub level_id:        Option<i64>,
  pub game_date:       String,
  pub game_time:       String,
  pub goals_allowed:   u32,
  pub shots_faced:     u32,
  pub saves:           u32,
  pub save_percentage: f64,
}

impl RawGoalieLine {
  pub fn into_line(self) -> Result<GoalieLine> {
    Ok(GoalieLine {
      game_id:         self.game_id,
      human_id:        self.human_id,
      team_id:         self.team_id,
      org_id:          self.org_id,
      level_id:        self.level_id,
      starts_at:       decode_date(&self.game_date)?.and_time(decode_time(&self.game_time)?),
      goals_allowed:   self.goals_allowed,
      shots_faced:     self.shots_faced,
      saves:           self.saves,
      save_percentage: self.save_percentage,
    })
  }
}

/// One `scope_stat_metrics` row with the metric name still as text.
pub struct RawMetric {
  pub human_id: HumanId,
  pub metric:   String,
  pub value:    f64,
  pub rank:     u32,
}
