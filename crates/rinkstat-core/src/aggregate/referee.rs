//! Referee aggregation.
//!
//! A game can have two referee slots. Penalties called in a game are shared
//! evenly between the distinct referees assigned to it, so two referees get
//! half credit each and a lone referee gets everything.

use std::collections::{BTreeMap, HashMap};

use super::{Exclusions, GameSpan, Tally, count, index_games};
use crate::{
  derive::per_game,
  event::{GameId, HumanId, Population},
  metric::{Metric, SubjectKind},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefereeTally {
  pub games_reffed:    u32,
  pub penalties_given: f64,
  pub gm_given:        f64,
  pub span:            GameSpan,
}

impl Tally for RefereeTally {
  const KIND: SubjectKind = SubjectKind::Referee;

  fn games(&self) -> u32 { self.games_reffed }

  fn span(&self) -> &GameSpan { &self.span }

  fn values(&self) -> Vec<(Metric, f64)> {
    vec![
      (Metric::GamesReffed, count(self.games_reffed)),
      (Metric::PenaltiesGiven, self.penalties_given),
      (
        Metric::PenaltiesPerGame,
        per_game(self.penalties_given, self.games_reffed),
      ),
      (Metric::GmGiven, self.gm_given),
      (Metric::GmPerGame, per_game(self.gm_given, self.games_reffed)),
    ]
  }

  fn aggregate(
    population: &Population,
    exclusions: &Exclusions,
  ) -> BTreeMap<HumanId, Self> {
    let games = index_games(population);

    // (penalties, game misconducts) called per game
    let mut called: HashMap<GameId, (u32, u32)> = HashMap::new();
    for penalty in &population.penalties {
      if !games.contains_key(&penalty.game_id) {
        continue;
      }
      let entry = called.entry(penalty.game_id).or_default();
      entry.0 += 1;
      if penalty.is_game_misconduct() {
        entry.1 += 1;
      }
    }

    let mut tallies: BTreeMap<HumanId, Self> = BTreeMap::new();
    for game in &population.games {
      let referees = game.referees();
      if referees.is_empty() {
        continue;
      }
      let share = 1.0 / referees.len() as f64;
      let (penalties, gms) = called.get(&game.game_id).copied().unwrap_or_default();

      for referee in referees {
        if exclusions.contains(referee) {
          continue;
        }
        let tally = tallies.entry(referee).or_default();
        tally.games_reffed += 1;
        tally.penalties_given += count(penalties) * share;
        tally.gm_given += count(gms) * share;
        tally.span.observe(game);
      }
    }

    tallies
  }
}
