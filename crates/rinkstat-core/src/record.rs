//! The rows the engine materialises: ranked accumulator records for scope
//! tables, and per-game lines for skaters and goalies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
  event::{GameId, HumanId, TeamId},
  metric::Metric,
};

/// Game id reserved for the watermark row in the per-game skater table.
pub const SENTINEL_GAME_ID: GameId = -1;

// ─── Accumulator records ─────────────────────────────────────────────────────

/// One value of one metric for one subject, with its rank in the scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
  pub metric: Metric,
  pub value:  f64,
  /// 1-based; 0 until the ranker has run.
  pub rank:   u32,
}

/// A subject's aggregate in one scope partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorRecord {
  pub human_id:      HumanId,
  /// The threshold count: games played, reffed, recorded... per kind.
  pub games:         u32,
  /// In the kind's metric order, see [`crate::metric::SubjectKind::metrics`].
  pub metrics:       Vec<MetricValue>,
  pub total_in_rank: u32,
  pub first_game_id: Option<GameId>,
  pub last_game_id:  Option<GameId>,
}

impl AccumulatorRecord {
  pub fn get(&self, metric: Metric) -> Option<&MetricValue> {
    self.metrics.iter().find(|m| m.metric == metric)
  }

  pub fn value(&self, metric: Metric) -> Option<f64> {
    self.get(metric).map(|m| m.value)
  }

  pub fn rank(&self, metric: Metric) -> Option<u32> {
    self.get(metric).map(|m| m.rank)
  }

  fn get_mut(&mut self, metric: Metric) -> Option<&mut MetricValue> {
    self.metrics.iter_mut().find(|m| m.metric == metric)
  }

  pub(crate) fn set_rank(&mut self, metric: Metric, rank: u32) {
    if let Some(m) = self.get_mut(metric) {
      m.rank = rank;
    }
  }
}

// ─── Per-game lines ──────────────────────────────────────────────────────────

/// A skater's stat line for a single game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkaterLine {
  pub game_id:         GameId,
  pub human_id:        HumanId,
  pub team_id:         TeamId,
  pub org_id:          i64,
  pub level_id:        Option<i64>,
  pub starts_at:       NaiveDateTime,
  pub goals:           u32,
  pub assists:         u32,
  pub points:          u32,
  pub penalty_minutes: u32,
}

impl SkaterLine {
  /// Lines with nothing to report are never stored.
  pub fn is_nonzero(&self) -> bool {
    self.goals > 0 || self.assists > 0 || self.penalty_minutes > 0
  }
}

/// A goalie's stat line for a single game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieLine {
  pub game_id:         GameId,
  pub human_id:        HumanId,
  pub team_id:         TeamId,
  pub org_id:          i64,
  pub level_id:        Option<i64>,
  pub starts_at:       NaiveDateTime,
  pub goals_allowed:   u32,
  pub shots_faced:     u32,
  pub saves:           u32,
  pub save_percentage: f64,
}

impl GoalieLine {
  pub fn is_nonzero(&self) -> bool { self.shots_faced > 0 }
}
