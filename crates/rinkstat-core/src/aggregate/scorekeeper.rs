//! Scorekeeper aggregation: games kept and shots on goal recorded.

use std::collections::BTreeMap;

use super::{Exclusions, GameSpan, Tally, count};
use crate::{
  derive::per_game,
  event::{HumanId, Population},
  metric::{Metric, SubjectKind},
};

/// Games a human kept score for, and the shots on goal they recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScorekeeperTally {
  pub games_recorded: u32,
  pub sog_given:      u32,
  pub span:           GameSpan,
}

impl Tally for ScorekeeperTally {
  const KIND: SubjectKind = SubjectKind::Scorekeeper;

  fn games(&self) -> u32 { self.games_recorded }

  fn span(&self) -> &GameSpan { &self.span }

  fn values(&self) -> Vec<(Metric, f64)> {
    vec![
      (Metric::GamesRecorded, count(self.games_recorded)),
      (Metric::SogGiven, count(self.sog_given)),
      (
        Metric::SogPerGame,
        per_game(count(self.sog_given), self.games_recorded),
      ),
    ]
  }

  fn aggregate(
    population: &Population,
    exclusions: &Exclusions,
  ) -> BTreeMap<HumanId, Self> {
    let mut tallies: BTreeMap<HumanId, Self> = BTreeMap::new();
    for game in &population.games {
      let Some(keeper) = game.scorekeeper_id else { continue };
      if exclusions.contains(keeper) {
        continue;
      }
      let tally = tallies.entry(keeper).or_default();
      tally.games_recorded += 1;
      tally.sog_given += game.home.shots.total() + game.visitor.shots.total();
      tally.span.observe(game);
    }
    tallies
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aggregate::testing::*;

  #[test]
  fn counts_both_teams_shots() {
    let mut g = game(1, day(1));
    g.scorekeeper_id = Some(60);
    g.home.shots = shots(20);
    g.visitor.shots = shots(14);
    let pop = population(vec![g, game(2, day(2))]);

    let tallies = ScorekeeperTally::aggregate(&pop, &Exclusions::none());
    assert_eq!(tallies.len(), 1);
    assert_eq!(tallies[&60].games_recorded, 1);
    assert_eq!(tallies[&60].sog_given, 34);
  }
}
