//! Event aggregation: one pass over a [`Population`] per subject kind,
//! producing an in-memory tally per human.
//!
//! Every function here is pure. Tallies are keyed in a `BTreeMap` so that
//! downstream ranking sees subjects in ascending id order.

pub mod goalie;
pub mod human;
pub mod referee;
pub mod scorekeeper;
pub mod skater;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::{
  event::{Game, GameId, HumanId, Population},
  metric::{Metric, SubjectKind},
};

pub use goalie::GoalieTally;
pub use human::HumanTally;
pub use referee::RefereeTally;
pub use scorekeeper::ScorekeeperTally;
pub use skater::SkaterTally;

/// A per-subject accumulator for one kind.
pub trait Tally: Default + Sized {
  const KIND: SubjectKind;

  /// The count the scope's minimum threshold is compared against.
  fn games(&self) -> u32;

  fn span(&self) -> &GameSpan;

  /// Raw counts and derived rates, in `KIND.metrics()` order.
  fn values(&self) -> Vec<(Metric, f64)>;

  /// One pass over `population`. Excluded humans and humans with no games
  /// never get an entry.
  fn aggregate(
    population: &Population,
    exclusions: &Exclusions,
  ) -> BTreeMap<HumanId, Self>;
}

// ─── Game span ───────────────────────────────────────────────────────────────

/// The earliest and latest game a subject was observed in, ordered by start
/// time and then by game id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameSpan {
  first: Option<(NaiveDateTime, GameId)>,
  last:  Option<(NaiveDateTime, GameId)>,
}

impl GameSpan {
  pub fn observe(&mut self, game: &Game) {
    let key = (game.starts_at(), game.game_id);
    if self.first.is_none_or(|first| key < first) {
      self.first = Some(key);
    }
    if self.last.is_none_or(|last| key > last) {
      self.last = Some(key);
    }
  }

  pub fn first_game_id(&self) -> Option<GameId> { self.first.map(|(_, id)| id) }

  pub fn last_game_id(&self) -> Option<GameId> { self.last.map(|(_, id)| id) }
}

// ─── Exclusions ──────────────────────────────────────────────────────────────

/// Humans that never receive stats (placeholder identities such as
/// "Empty Net").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(HashSet<HumanId>);

impl Exclusions {
  pub fn none() -> Self { Self::default() }

  pub fn contains(&self, human_id: HumanId) -> bool { self.0.contains(&human_id) }
}

impl FromIterator<HumanId> for Exclusions {
  fn from_iter<I: IntoIterator<Item = HumanId>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Games of a population by id.
pub(crate) fn index_games(population: &Population) -> HashMap<GameId, &Game> {
  population.games.iter().map(|g| (g.game_id, g)).collect()
}

/// Lossless for every count a hockey season produces.
pub(crate) fn count(n: u32) -> f64 { f64::from(n) }
