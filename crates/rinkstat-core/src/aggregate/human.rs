//! The composite view: every role a human played, counted together.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{Exclusions, GameSpan, Tally, count, index_games};
use crate::{
  event::{GameId, HumanId, Population},
  metric::{Metric, SubjectKind},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HumanTally {
  /// Distinct games in any role.
  pub games_total:       u32,
  pub games_skater:      u32,
  pub games_goalie:      u32,
  pub games_referee:     u32,
  pub games_scorekeeper: u32,
  pub span:              GameSpan,
}

impl Tally for HumanTally {
  const KIND: SubjectKind = SubjectKind::Human;

  fn games(&self) -> u32 { self.games_total }

  fn span(&self) -> &GameSpan { &self.span }

  fn values(&self) -> Vec<(Metric, f64)> {
    vec![
      (Metric::GamesTotal, count(self.games_total)),
      (Metric::GamesSkater, count(self.games_skater)),
      (Metric::GamesGoalie, count(self.games_goalie)),
      (Metric::GamesReferee, count(self.games_referee)),
      (Metric::GamesScorekeeper, count(self.games_scorekeeper)),
    ]
  }

  fn aggregate(
    population: &Population,
    exclusions: &Exclusions,
  ) -> BTreeMap<HumanId, Self> {
    #[derive(Default)]
    struct Roles {
      skater:      HashSet<GameId>,
      goalie:      HashSet<GameId>,
      referee:     HashSet<GameId>,
      scorekeeper: HashSet<GameId>,
      any:         BTreeSet<GameId>,
    }

    let games = index_games(population);
    let mut roles: BTreeMap<HumanId, Roles> = BTreeMap::new();

    for entry in &population.roster {
      if !games.contains_key(&entry.game_id) || exclusions.contains(entry.human_id) {
        continue;
      }
      let r = roles.entry(entry.human_id).or_default();
      if entry.is_goalie() {
        r.goalie.insert(entry.game_id);
      } else {
        r.skater.insert(entry.game_id);
      }
      r.any.insert(entry.game_id);
    }

    for game in &population.games {
      for referee in game.referees() {
        if !exclusions.contains(referee) {
          let r = roles.entry(referee).or_default();
          r.referee.insert(game.game_id);
          r.any.insert(game.game_id);
        }
      }
      if let Some(keeper) = game.scorekeeper_id.filter(|id| !exclusions.contains(*id)) {
        let r = roles.entry(keeper).or_default();
        r.scorekeeper.insert(game.game_id);
        r.any.insert(game.game_id);
      }
    }

    roles
      .into_iter()
      .map(|(human_id, r)| {
        let mut span = GameSpan::default();
        for game in r.any.iter().filter_map(|id| games.get(id)) {
          span.observe(game);
        }
        let tally = Self {
          games_total: r.any.len() as u32,
          games_skater: r.skater.len() as u32,
          games_goalie: r.goalie.len() as u32,
          games_referee: r.referee.len() as u32,
          games_scorekeeper: r.scorekeeper.len() as u32,
          span,
        };
        (human_id, tally)
      })
      .collect()
  }
}
