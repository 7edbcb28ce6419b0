//! Skater aggregation, both per scope and per game.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use super::{Exclusions, GameSpan, Tally, count, index_games};
use crate::{
  derive::per_game,
  event::{Game, GameId, HumanId, Penalty, PenaltyMinutes, Population, TeamId},
  metric::{Metric, SubjectKind},
  record::SkaterLine,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkaterTally {
  pub games_played:    u32,
  pub goals:           u32,
  pub assists:         u32,
  pub penalties:       u32,
  pub gm_penalties:    u32,
  pub penalty_minutes: u32,
  pub span:            GameSpan,
}

impl SkaterTally {
  pub fn points(&self) -> u32 { self.goals + self.assists }
}

impl Tally for SkaterTally {
  const KIND: SubjectKind = SubjectKind::Skater;

  fn games(&self) -> u32 { self.games_played }

  fn span(&self) -> &GameSpan { &self.span }

  fn values(&self) -> Vec<(Metric, f64)> {
    let gp = self.games_played;
    vec![
      (Metric::GamesPlayed, count(gp)),
      (Metric::Goals, count(self.goals)),
      (Metric::Assists, count(self.assists)),
      (Metric::Points, count(self.points())),
      (Metric::Penalties, count(self.penalties)),
      (Metric::GmPenalties, count(self.gm_penalties)),
      (Metric::PenaltyMinutes, count(self.penalty_minutes)),
      (Metric::GoalsPerGame, per_game(count(self.goals), gp)),
      (Metric::AssistsPerGame, per_game(count(self.assists), gp)),
      (Metric::PointsPerGame, per_game(count(self.points()), gp)),
      (Metric::PenaltiesPerGame, per_game(count(self.penalties), gp)),
      (Metric::GmPenaltiesPerGame, per_game(count(self.gm_penalties), gp)),
    ]
  }

  fn aggregate(
    population: &Population,
    exclusions: &Exclusions,
  ) -> BTreeMap<HumanId, Self> {
    let games = index_games(population);
    let mut tallies: BTreeMap<HumanId, Self> = BTreeMap::new();
    let mut on_roster: HashSet<(GameId, HumanId)> = HashSet::new();

    for entry in &population.roster {
      if entry.is_goalie() || exclusions.contains(entry.human_id) {
        continue;
      }
      let Some(game) = games.get(&entry.game_id) else { continue };
      if on_roster.insert((entry.game_id, entry.human_id)) {
        let tally = tallies.entry(entry.human_id).or_default();
        tally.games_played += 1;
        tally.span.observe(game);
      }
    }

    for goal in &population.goals {
      if let Some(t) = credited(&mut tallies, &on_roster, goal.game_id, goal.scorer_id) {
        t.goals += 1;
      }
      for assister in goal.assisters() {
        if let Some(t) = credited(&mut tallies, &on_roster, goal.game_id, Some(assister)) {
          t.assists += 1;
        }
      }
    }

    for penalty in &population.penalties {
      if let Some(t) = credited(&mut tallies, &on_roster, penalty.game_id, penalty.penalized_id) {
        let minutes = checked_minutes(penalty);
        t.penalties += 1;
        t.penalty_minutes += minutes.contribution();
        if minutes == PenaltyMinutes::GameMisconduct {
          t.gm_penalties += 1;
        }
      }
    }

    tallies
  }
}

fn credited<'a>(
  tallies: &'a mut BTreeMap<HumanId, SkaterTally>,
  on_roster: &HashSet<(GameId, HumanId)>,
  game_id: GameId,
  human_id: Option<HumanId>,
) -> Option<&'a mut SkaterTally> {
  let human_id = human_id?;
  if !on_roster.contains(&(game_id, human_id)) {
    return None;
  }
  tallies.get_mut(&human_id)
}

/// Interpret a penalty's minutes, warning on an unreadable code.
fn checked_minutes(penalty: &Penalty) -> PenaltyMinutes {
  let minutes = penalty.minutes();
  if let PenaltyMinutes::Unparseable(code) = &minutes {
    warn!(
      penalty_id = penalty.penalty_id,
      game_id = penalty.game_id,
      code = %code,
      "could not read penalty minutes; counting 0"
    );
  }
  minutes
}

// ─── Per-game lines ──────────────────────────────────────────────────────────

/// One line per (game, skater) in `population`, keeping only lines with a
/// non-zero stat. `only` restricts the output to a single human.
pub fn lines(
  population: &Population,
  exclusions: &Exclusions,
  only: Option<HumanId>,
) -> Vec<SkaterLine> {
  let games = index_games(population);
  let mut by_key: BTreeMap<(GameId, HumanId), SkaterLine> = BTreeMap::new();

  for entry in &population.roster {
    if entry.is_goalie()
      || exclusions.contains(entry.human_id)
      || only.is_some_and(|id| id != entry.human_id)
    {
      continue;
    }
    let Some(game) = games.get(&entry.game_id) else { continue };
    by_key.entry((entry.game_id, entry.human_id)).or_insert_with(|| {
      blank_line(entry.game_id, entry.human_id, entry.team_id, game)
    });
  }

  for goal in &population.goals {
    if let Some(scorer) = goal.scorer_id
      && let Some(line) = by_key.get_mut(&(goal.game_id, scorer))
    {
      line.goals += 1;
      line.points += 1;
    }
    for assister in goal.assisters() {
      if let Some(line) = by_key.get_mut(&(goal.game_id, assister)) {
        line.assists += 1;
        line.points += 1;
      }
    }
  }

  for penalty in &population.penalties {
    let Some(penalized) = penalty.penalized_id else { continue };
    if let Some(line) = by_key.get_mut(&(penalty.game_id, penalized)) {
      line.penalty_minutes += checked_minutes(penalty).contribution();
    }
  }

  by_key.into_values().filter(SkaterLine::is_nonzero).collect()
}

fn blank_line(
  game_id: GameId,
  human_id: HumanId,
  team_id: TeamId,
  game: &Game,
) -> SkaterLine {
  SkaterLine {
    game_id,
    human_id,
    team_id,
    org_id: game.org_id,
    level_id: game.level_id,
    starts_at: game.starts_at(),
    goals: 0,
    assists: 0,
    points: 0,
    penalty_minutes: 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aggregate::testing::*;

  #[test]
  fn goals_assists_and_game_misconduct() {
    let mut pop = population(vec![game(1, day(1))]);
    pop.roster.push(skater(1, 10, 100));
    pop.goals.push(goal(1, Some(10), None, None));
    pop.goals.push(goal(1, Some(10), None, None));
    pop.goals.push(goal(1, Some(11), Some(10), None));
    pop.penalties.push(penalty(1, Some(10), Some("GM")));

    let tallies = SkaterTally::aggregate(&pop, &Exclusions::none());
    let t = &tallies[&10];
    assert_eq!(t.goals, 2);
    assert_eq!(t.assists, 1);
    assert_eq!(t.points(), 3);
    assert_eq!(t.penalties, 1);
    assert_eq!(t.gm_penalties, 1);
    assert_eq!(t.penalty_minutes, 10);
  }

  #[test]
  fn events_only_count_for_rostered_skaters() {
    let mut pop = population(vec![game(1, day(1))]);
    pop.roster.push(skater(1, 10, 100));
    pop.roster.push(goalie(1, 20, 200));
    pop.goals.push(goal(1, Some(20), Some(30), None));
    pop.penalties.push(penalty(1, Some(20), Some("2")));

    let tallies = SkaterTally::aggregate(&pop, &Exclusions::none());
    assert_eq!(tallies.keys().copied().collect::<Vec<_>>(), vec![10]);
    assert_eq!(tallies[&10].goals, 0);
  }

  #[test]
  fn games_are_counted_once_per_game() {
    let mut pop = population(vec![game(1, day(1)), game(2, day(2))]);
    pop.roster.push(skater(1, 10, 100));
    pop.roster.push(skater(1, 10, 100));
    pop.roster.push(skater(2, 10, 100));

    let tallies = SkaterTally::aggregate(&pop, &Exclusions::none());
    assert_eq!(tallies[&10].games_played, 2);
    assert_eq!(tallies[&10].span.first_game_id(), Some(1));
    assert_eq!(tallies[&10].span.last_game_id(), Some(2));
  }

  #[test]
  fn excluded_humans_never_appear() {
    let mut pop = population(vec![game(1, day(1))]);
    pop.roster.push(skater(1, 10, 100));
    pop.roster.push(skater(1, 99, 100));

    let exclusions: Exclusions = [99].into_iter().collect();
    let tallies = SkaterTally::aggregate(&pop, &exclusions);
    assert!(!tallies.contains_key(&99));
  }

  #[test]
  fn unparseable_minutes_count_zero() {
    let mut pop = population(vec![game(1, day(1))]);
    pop.roster.push(skater(1, 10, 100));
    pop.penalties.push(penalty(1, Some(10), Some("2+10")));

    let tallies = SkaterTally::aggregate(&pop, &Exclusions::none());
    assert_eq!(tallies[&10].penalties, 1);
    assert_eq!(tallies[&10].penalty_minutes, 0);
  }

  #[test]
  fn lines_drop_zero_rows_and_respect_filter() {
    let mut pop = population(vec![game(1, day(1))]);
    pop.roster.push(skater(1, 10, 100));
    pop.roster.push(skater(1, 11, 100));
    pop.roster.push(skater(1, 12, 200));
    pop.goals.push(goal(1, Some(10), Some(11), None));

    let all = lines(&pop, &Exclusions::none(), None);
    assert_eq!(all.iter().map(|l| l.human_id).collect::<Vec<_>>(), vec![10, 11]);
    assert_eq!(all[0].points, 1);
    assert_eq!(all[1].assists, 1);

    let only = lines(&pop, &Exclusions::none(), Some(11));
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].human_id, 11);
  }
}
