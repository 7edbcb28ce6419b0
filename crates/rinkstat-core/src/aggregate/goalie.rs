//! Goalie aggregation. Scope tallies are read off the scoreboard (the
//! opponent's final score and shots); per-game lines come from the goalie
//! save records.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Exclusions, GameSpan, Tally, count, index_games};
use crate::{
  derive::{per_game, save_percentage},
  event::{GameId, HumanId, Population, TeamId},
  metric::{Metric, SubjectKind},
  record::GoalieLine,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalieTally {
  pub games_played:  u32,
  pub goals_allowed: u32,
  pub shots_faced:   u32,
  pub span:          GameSpan,
}

impl Tally for GoalieTally {
  const KIND: SubjectKind = SubjectKind::Goalie;

  fn games(&self) -> u32 { self.games_played }

  fn span(&self) -> &GameSpan { &self.span }

  fn values(&self) -> Vec<(Metric, f64)> {
    vec![
      (Metric::GamesPlayed, count(self.games_played)),
      (Metric::GoalsAllowed, count(self.goals_allowed)),
      (Metric::ShotsFaced, count(self.shots_faced)),
      (
        Metric::GoalsAllowedPerGame,
        per_game(count(self.goals_allowed), self.games_played),
      ),
      (
        Metric::SavePercentage,
        save_percentage(self.shots_faced, self.goals_allowed),
      ),
    ]
  }

  fn aggregate(
    population: &Population,
    exclusions: &Exclusions,
  ) -> BTreeMap<HumanId, Self> {
    let games = index_games(population);
    let mut tallies: BTreeMap<HumanId, Self> = BTreeMap::new();
    let mut seen: HashSet<(GameId, HumanId)> = HashSet::new();

    for entry in population.roster.iter().filter(|e| e.is_goalie()) {
      if exclusions.contains(entry.human_id) {
        continue;
      }
      let Some(game) = games.get(&entry.game_id) else { continue };
      if !seen.insert((entry.game_id, entry.human_id)) {
        continue;
      }

      let opponent = game.opponent_of(entry.team_id);
      let tally = tallies.entry(entry.human_id).or_default();
      tally.games_played += 1;
      tally.goals_allowed += opponent.final_score.unwrap_or(0);
      tally.shots_faced += opponent.shots.total();
      tally.span.observe(game);
    }

    tallies
  }
}

// ─── Per-game lines ──────────────────────────────────────────────────────────

/// One line per goalie save record whose goalie is on the game's roster,
/// keeping only lines that faced at least one shot.
pub fn lines(
  population: &Population,
  exclusions: &Exclusions,
  only: Option<HumanId>,
) -> Vec<GoalieLine> {
  let games = index_games(population);
  let teams: HashMap<(GameId, HumanId), TeamId> = population
    .roster
    .iter()
    .map(|e| ((e.game_id, e.human_id), e.team_id))
    .collect();

  let mut lines: Vec<GoalieLine> = population
    .saves
    .iter()
    .filter(|s| !exclusions.contains(s.goalie_id))
    .filter(|s| only.is_none_or(|id| id == s.goalie_id))
    .filter(|s| s.shots_against > 0)
    .filter_map(|s| {
      let game = games.get(&s.game_id)?;
      let team_id = *teams.get(&(s.game_id, s.goalie_id))?;
      Some(GoalieLine {
        game_id: s.game_id,
        human_id: s.goalie_id,
        team_id,
        org_id: game.org_id,
        level_id: game.level_id,
        starts_at: game.starts_at(),
        goals_allowed: s.goals_allowed,
        shots_faced: s.shots_against,
        saves: s.saves_count,
        save_percentage: save_percentage(s.shots_against, s.goals_allowed),
      })
    })
    .collect();

  lines.sort_by_key(|l| (l.game_id, l.human_id));
  lines
}
