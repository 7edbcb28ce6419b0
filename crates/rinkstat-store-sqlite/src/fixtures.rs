//! Test-only ingestion. The engine never writes event tables, so tests fill
//! them the way the upstream pipeline would.

use chrono::NaiveDateTime;
use rinkstat_core::event::{
  Game, GameId, Goal, GoalieSaves, HumanId, Penalty, PeriodShots, RosterEntry, TeamId,
  TeamLine,
};
use rusqlite::types::Value;

use crate::{Result, SqliteStore, encode::decode_dt};

pub const HOME: TeamId = 100;
pub const VISITOR: TeamId = 200;

pub fn at(s: &str) -> NaiveDateTime { decode_dt(s).expect("fixture timestamp") }

/// A final game in `division_id` of org 1 with empty scoreboards.
pub fn game(game_id: GameId, division_id: i64, starts: &str) -> Game {
  let starts = at(starts);
  Game {
    game_id,
    org_id: 1,
    division_id,
    level_id: None,
    date: starts.date(),
    time: starts.time(),
    status: "Final".into(),
    home: TeamLine { team_id: HOME, ..TeamLine::default() },
    visitor: TeamLine { team_id: VISITOR, ..TeamLine::default() },
    referee_1_id: None,
    referee_2_id: None,
    scorekeeper_id: None,
  }
}

pub fn shots(n: u32) -> PeriodShots { PeriodShots { period_1: n, ..PeriodShots::default() } }

pub fn skater(game_id: GameId, human_id: HumanId, team_id: TeamId) -> RosterEntry {
  RosterEntry { game_id, human_id, team_id, role: "F".into() }
}

pub fn goalie(game_id: GameId, human_id: HumanId, team_id: TeamId) -> RosterEntry {
  RosterEntry { game_id, human_id, team_id, role: "G".into() }
}

pub fn goal(goal_id: i64, game_id: GameId, scorer: HumanId, assist: Option<HumanId>) -> Goal {
  Goal {
    goal_id,
    game_id,
    scorer_id: Some(scorer),
    assist_1_id: assist,
    assist_2_id: None,
  }
}

pub fn penalty(penalty_id: i64, game_id: GameId, penalized: HumanId, minutes: &str) -> Penalty {
  Penalty {
    penalty_id,
    game_id,
    penalized_id: Some(penalized),
    penalty_minutes: Some(minutes.to_owned()),
  }
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

impl SqliteStore {
  async fn exec(&self, sql: &'static str, values: Vec<Value>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(sql, rusqlite::params_from_iter(values))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn ingest_human(&self, human_id: HumanId, first: &str, last: &str) -> Result<()> {
    self
      .exec(
        "INSERT INTO humans (human_id, first_name, middle_name, last_name)
         VALUES (?1, ?2, '', ?3)",
        vec![human_id.into(), first.to_owned().into(), last.to_owned().into()],
      )
      .await
  }

  /// The placeholder humans a real database carries, including the
  /// sentinel anchor. Ids 9001..=9003.
  pub async fn ingest_placeholders(&self) -> Result<()> {
    self.ingest_human(9001, "Incognito", "Human").await?;
    self.ingest_human(9002, "Empty", "Net").await?;
    self.ingest_human(9003, "Unknown", "Player").await
  }

  pub async fn ingest_org(&self, org_id: i64) -> Result<()> {
    self
      .exec(
        "INSERT INTO organizations (org_id, name) VALUES (?1, ?2)",
        vec![org_id.into(), format!("org {org_id}").into()],
      )
      .await
  }

  pub async fn ingest_division(
    &self,
    division_id: i64,
    org_id: i64,
    level_id: Option<i64>,
  ) -> Result<()> {
    self
      .exec(
        "INSERT INTO divisions (division_id, org_id, level_id) VALUES (?1, ?2, ?3)",
        vec![division_id.into(), org_id.into(), level_id.into()],
      )
      .await
  }

  pub async fn ingest_game(&self, g: &Game) -> Result<()> {
    let side = |t: &TeamLine| -> Vec<Value> {
      vec![
        t.shots.period_1.into(),
        t.shots.period_2.into(),
        t.shots.period_3.into(),
        t.shots.overtime.into(),
        t.shots.shootout.into(),
      ]
    };
    let mut values: Vec<Value> = vec![
      g.game_id.into(),
      g.org_id.into(),
      g.division_id.into(),
      g.date.format("%Y-%m-%d").to_string().into(),
      g.time.format("%H:%M:%S").to_string().into(),
      g.status.clone().into(),
      g.home.team_id.into(),
      g.visitor.team_id.into(),
      g.home.final_score.into(),
      g.visitor.final_score.into(),
    ];
    values.extend(side(&g.home));
    values.extend(side(&g.visitor));
    values.extend([g.referee_1_id.into(), g.referee_2_id.into(), g.scorekeeper_id.into()]);

    self
      .exec(
        "INSERT INTO games (
           game_id, org_id, division_id, date, time, status,
           home_team_id, visitor_team_id, home_final_score, visitor_final_score,
           home_period_1_shots, home_period_2_shots, home_period_3_shots,
           home_ot_shots, home_so_shots,
           visitor_period_1_shots, visitor_period_2_shots, visitor_period_3_shots,
           visitor_ot_shots, visitor_so_shots,
           referee_1_id, referee_2_id, scorekeeper_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
        values,
      )
      .await
  }

  pub async fn ingest_roster(&self, e: &RosterEntry) -> Result<()> {
    self
      .exec(
        "INSERT INTO game_rosters (game_id, human_id, team_id, role) VALUES (?1, ?2, ?3, ?4)",
        vec![e.game_id.into(), e.human_id.into(), e.team_id.into(), e.role.clone().into()],
      )
      .await
  }

  pub async fn ingest_goal(&self, g: &Goal) -> Result<()> {
    self
      .exec(
        "INSERT INTO goals (goal_id, game_id, goal_scorer_id, assist_1_id, assist_2_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          g.goal_id.into(),
          g.game_id.into(),
          g.scorer_id.into(),
          g.assist_1_id.into(),
          g.assist_2_id.into(),
        ],
      )
      .await
  }

  pub async fn ingest_penalty(&self, p: &Penalty) -> Result<()> {
    self
      .exec(
        "INSERT INTO penalties (penalty_id, game_id, penalized_player_id, penalty_minutes)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          p.penalty_id.into(),
          p.game_id.into(),
          p.penalized_id.into(),
          p.penalty_minutes.clone().into(),
        ],
      )
      .await
  }

  pub async fn ingest_saves(&self, s: &GoalieSaves) -> Result<()> {
    self
      .exec(
        "INSERT INTO goalie_saves (game_id, goalie_id, goals_allowed, shots_against, saves_count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          s.game_id.into(),
          s.goalie_id.into(),
          s.goals_allowed.into(),
          s.shots_against.into(),
          s.saves_count.into(),
        ],
      )
      .await
  }

  /// Flip a game's status, e.g. to simulate a late correction.
  pub async fn set_status(&self, game_id: GameId, status: &str) -> Result<()> {
    self
      .exec(
        "UPDATE games SET status = ?2 WHERE game_id = ?1",
        vec![game_id.into(), status.to_owned().into()],
      )
      .await
  }

  /// Rewrite a game's start time as raw text, e.g. the short `HH:MM` form.
  pub async fn set_time(&self, game_id: GameId, time: &str) -> Result<()> {
    self
      .exec(
        "UPDATE games SET time = ?2 WHERE game_id = ?1",
        vec![game_id.into(), time.to_owned().into()],
      )
      .await
  }

  /// Run raw DDL, e.g. a trigger that makes some writes fail.
  pub async fn exec_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn count_rows(&self, table: &'static str) -> Result<i64> {
    let n = self
      .conn
      .call(move |conn| {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n)
      })
      .await?;
    Ok(n)
  }
}
