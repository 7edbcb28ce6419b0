//! Derived metrics: per-game rates and save percentage, plus the step that
//! turns tallies into threshold-filtered accumulator records.

use std::collections::BTreeMap;

use crate::{
  aggregate::Tally,
  event::HumanId,
  record::{AccumulatorRecord, MetricValue},
};

/// `numerator / games`, or `0.0` when there are no games.
pub fn per_game(numerator: f64, games: u32) -> f64 {
  if games == 0 {
    0.0
  } else {
    numerator / f64::from(games)
  }
}

/// `(shots - goals) / shots`, or `0.0` when no shots were faced.
pub fn save_percentage(shots_faced: u32, goals_allowed: u32) -> f64 {
  if shots_faced == 0 {
    0.0
  } else {
    (f64::from(shots_faced) - f64::from(goals_allowed)) / f64::from(shots_faced)
  }
}

/// Build unranked records for every subject with at least `min_games`
/// games, in ascending human id order.
pub fn enrich<T: Tally>(
  tallies: BTreeMap<HumanId, T>,
  min_games: u32,
) -> Vec<AccumulatorRecord> {
  tallies
    .into_iter()
    .filter(|(_, tally)| tally.games() > 0 && tally.games() >= min_games)
    .map(|(human_id, tally)| AccumulatorRecord {
      human_id,
      games: tally.games(),
      metrics: tally
        .values()
        .into_iter()
        .map(|(metric, value)| MetricValue { metric, value, rank: 0 })
        .collect(),
      total_in_rank: 0,
      first_game_id: tally.span().first_game_id(),
      last_game_id: tally.span().last_game_id(),
    })
    .collect()
}
