//! [`SqliteStore`]: the SQLite implementation of [`EventStore`] and
//! [`StatsStore`].

use std::{collections::HashMap, path::Path};

use chrono::NaiveDateTime;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use rinkstat_core::{
  event::{
    Goal, GoalieSaves, Human, HumanId, PeriodShots, Penalty, PersonName, Population,
    RosterEntry,
  },
  record::{AccumulatorRecord, GoalieLine, MetricValue, SENTINEL_GAME_ID, SkaterLine},
  scope::{GameFilter, StatsTable},
  store::{EventStore, StatsStore},
};

use crate::{
  Result,
  encode::{
    RawGame, RawGoalieLine, RawMetric, RawSkaterLine, created_at, decode_date,
    decode_dt, decode_metric, decode_time, encode_date, encode_dt, encode_metric,
    encode_time,
  },
  schema::SCHEMA,
};

// ─── SQL fragments ───────────────────────────────────────────────────────────

/// Eligible games. Binds `?1` org, `?2` division, `?3` level, `?4` earliest
/// and `?5` latest start; NULL disables a condition.
///
/// `HH:MM` times are padded to `HH:MM:SS` so starts compare against
/// [`encode_dt`] bounds as text.
const ELIGIBLE_GAMES: &str = "
  FROM games g
  LEFT JOIN divisions d ON d.division_id = g.division_id
  WHERE g.status GLOB 'Final*'
    AND (?1 IS NULL OR g.org_id = ?1)
    AND (?2 IS NULL OR g.division_id = ?2)
    AND (?3 IS NULL OR d.level_id = ?3)
    AND (?4 IS NULL OR (g.date || ' ' || substr(g.time || ':00', 1, 8)) >= ?4)
    AND (?5 IS NULL OR (g.date || ' ' || substr(g.time || ':00', 1, 8)) <= ?5)";

const SKATER_LINE_COLUMNS: &str = "game_id, human_id, team_id, org_id, level_id, game_date, \
                                   game_time, goals, assists, points, penalty_minutes";

const GOALIE_LINE_COLUMNS: &str = "game_id, human_id, team_id, org_id, level_id, game_date, \
                                   game_time, goals_allowed, shots_faced, saves, save_percentage";

/// Owned, `'static` bind values for [`ELIGIBLE_GAMES`].
#[derive(Clone)]
struct FilterParams {
  org_id:      Option<i64>,
  division_id: Option<i64>,
  level_id:    Option<i64>,
  from:        Option<String>,
  to:          Option<String>,
}

impl From<&GameFilter> for FilterParams {
  fn from(f: &GameFilter) -> Self {
    Self {
      org_id:      f.org_id,
      division_id: f.division_id,
      level_id:    f.level_id,
      from:        f.starts_from.map(encode_dt),
      to:          f.starts_to.map(encode_dt),
    }
  }
}

macro_rules! filter_params {
  ($p:expr) => {
    rusqlite::params![$p.org_id, $p.division_id, $p.level_id, $p.from, $p.to]
  };
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rinkstat store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = crate::Error;

  async fn get_human(&self, id: HumanId) -> Result<Option<Human>> {
    let human = self
      .conn
      .call(move |conn| {
        let human = conn
          .query_row(
            "SELECT human_id, first_name, middle_name, last_name
             FROM humans WHERE human_id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(Human {
                human_id: row.get(0)?,
                name:     PersonName {
                  first:  row.get(1)?,
                  middle: row.get(2)?,
                  last:   row.get(3)?,
                },
              })
            },
          )
          .optional()?;
        Ok(human)
      })
      .await?;
    Ok(human)
  }

  async fn human_ids_by_names<'a>(&'a self, names: &'a [PersonName]) -> Result<Vec<HumanId>> {
    let names = names.to_vec();
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT human_id FROM humans
           WHERE first_name = ?1 AND middle_name = ?2 AND last_name = ?3
           ORDER BY human_id",
        )?;
        let mut ids = Vec::new();
        for name in &names {
          let found = stmt
            .query_map(rusqlite::params![name.first, name.middle, name.last], |row| {
              row.get::<_, HumanId>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          ids.extend(found);
        }
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn list_org_ids(&self) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT org_id FROM organizations ORDER BY org_id")?;
        let ids = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn list_division_ids(&self, org_id: i64) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT division_id FROM divisions WHERE org_id = ?1 ORDER BY division_id")?;
        let ids = stmt
          .query_map(rusqlite::params![org_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn list_level_ids(&self) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT level_id FROM divisions
           WHERE level_id IS NOT NULL ORDER BY level_id",
        )?;
        let ids = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn latest_final_game<'a>(
    &'a self,
    filter: &'a GameFilter,
  ) -> Result<Option<NaiveDateTime>> {
    let p = FilterParams::from(filter);
    let latest: Option<String> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT MAX(g.date || ' ' || substr(g.time || ':00', 1, 8)) {ELIGIBLE_GAMES}"
        );
        let latest: Option<String> = conn.query_row(&sql, filter_params!(p), |row| row.get(0))?;
        Ok(latest)
      })
      .await?;

    latest.as_deref().map(decode_dt).transpose()
  }

  async fn load_population<'a>(&'a self, filter: &'a GameFilter) -> Result<Population> {
    let p = FilterParams::from(filter);
    let (raw_games, roster, goals, penalties, saves) = self
      .conn
      .call(move |conn| {
        let games_sql = format!(
          "SELECT g.game_id, g.org_id, g.division_id, d.level_id, g.date, g.time, g.status,
                  g.home_team_id, g.visitor_team_id,
                  g.home_final_score, g.visitor_final_score,
                  COALESCE(g.home_period_1_shots, 0), COALESCE(g.home_period_2_shots, 0),
                  COALESCE(g.home_period_3_shots, 0), COALESCE(g.home_ot_shots, 0),
                  COALESCE(g.home_so_shots, 0),
                  COALESCE(g.visitor_period_1_shots, 0), COALESCE(g.visitor_period_2_shots, 0),
                  COALESCE(g.visitor_period_3_shots, 0), COALESCE(g.visitor_ot_shots, 0),
                  COALESCE(g.visitor_so_shots, 0),
                  g.referee_1_id, g.referee_2_id, g.scorekeeper_id
           {ELIGIBLE_GAMES}
           ORDER BY g.date, g.time, g.game_id"
        );
        let mut stmt = conn.prepare(&games_sql)?;
        let raw_games = stmt
          .query_map(filter_params!(p), |row| {
            Ok(RawGame {
              game_id:             row.get(0)?,
              org_id:              row.get(1)?,
              division_id:         row.get(2)?,
              level_id:            row.get(3)?,
              date:                row.get(4)?,
              time:                row.get(5)?,
              status:              row.get(6)?,
              home_team_id:        row.get(7)?,
              visitor_team_id:     row.get(8)?,
              home_final_score:    row.get(9)?,
              visitor_final_score: row.get(10)?,
              home_shots:          PeriodShots {
                period_1: row.get(11)?,
                period_2: row.get(12)?,
                period_3: row.get(13)?,
                overtime: row.get(14)?,
                shootout: row.get(15)?,
              },
              visitor_shots:       PeriodShots {
                period_1: row.get(16)?,
                period_2: row.get(17)?,
                period_3: row.get(18)?,
                overtime: row.get(19)?,
                shootout: row.get(20)?,
              },
              referee_1_id:        row.get(21)?,
              referee_2_id:        row.get(22)?,
              scorekeeper_id:      row.get(23)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let in_games = format!("game_id IN (SELECT g.game_id {ELIGIBLE_GAMES})");

        let mut stmt = conn.prepare(&format!(
          "SELECT game_id, human_id, team_id, role FROM game_rosters
           WHERE {in_games} ORDER BY game_id, human_id"
        ))?;
        let roster = stmt
          .query_map(filter_params!(p), |row| {
            Ok(RosterEntry {
              game_id:  row.get(0)?,
              human_id: row.get(1)?,
              team_id:  row.get(2)?,
              role:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT goal_id, game_id, goal_scorer_id, assist_1_id, assist_2_id FROM goals
           WHERE {in_games} ORDER BY goal_id"
        ))?;
        let goals = stmt
          .query_map(filter_params!(p), |row| {
            Ok(Goal {
              goal_id:     row.get(0)?,
              game_id:     row.get(1)?,
              scorer_id:   row.get(2)?,
              assist_1_id: row.get(3)?,
              assist_2_id: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT penalty_id, game_id, penalized_player_id, penalty_minutes FROM penalties
           WHERE {in_games} ORDER BY penalty_id"
        ))?;
        let penalties = stmt
          .query_map(filter_params!(p), |row| {
            Ok(Penalty {
              penalty_id:      row.get(0)?,
              game_id:         row.get(1)?,
              penalized_id:    row.get(2)?,
              penalty_minutes: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT game_id, goalie_id, goals_allowed, shots_against, saves_count
           FROM goalie_saves WHERE {in_games} ORDER BY game_id, goalie_id"
        ))?;
        let saves = stmt
          .query_map(filter_params!(p), |row| {
            Ok(GoalieSaves {
              game_id:       row.get(0)?,
              goalie_id:     row.get(1)?,
              goals_allowed: row.get(2)?,
              shots_against: row.get(3)?,
              saves_count:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((raw_games, roster, goals, penalties, saves))
      })
      .await?;

    let games = raw_games
      .into_iter()
      .map(RawGame::into_game)
      .collect::<Result<Vec<_>>>()?;

    Ok(Population { games, roster, goals, penalties, saves })
  }
}

// ─── StatsStore impl ─────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  // ── Scope tables ──────────────────────────────────────────────────────────

  async fn delete_scope_partition(&self, table: StatsTable, aggregation_id: i64) -> Result<usize> {
    let name = table.name();
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM scope_stat_metrics WHERE table_name = ?1 AND aggregation_id = ?2",
          rusqlite::params![name, aggregation_id],
        )?;
        let deleted = tx.execute(
          "DELETE FROM scope_stats WHERE table_name = ?1 AND aggregation_id = ?2",
          rusqlite::params![name, aggregation_id],
        )?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;
    Ok(deleted)
  }

  async fn insert_scope_records(
    &self,
    table: StatsTable,
    aggregation_id: i64,
    records: Vec<AccumulatorRecord>,
  ) -> Result<()> {
    let name = table.name();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut record_stmt = tx.prepare_cached(
            "INSERT INTO scope_stats
               (table_name, aggregation_id, human_id, games, total_in_rank,
                first_game_id, last_game_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          let mut metric_stmt = tx.prepare_cached(
            "INSERT INTO scope_stat_metrics
               (table_name, aggregation_id, human_id, metric, value, rank)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for record in &records {
            record_stmt.execute(rusqlite::params![
              name,
              aggregation_id,
              record.human_id,
              record.games,
              record.total_in_rank,
              record.first_game_id,
              record.last_game_id,
            ])?;
            for m in &record.metrics {
              metric_stmt.execute(rusqlite::params![
                name,
                aggregation_id,
                record.human_id,
                encode_metric(m.metric),
                m.value,
                m.rank,
              ])?;
            }
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_scope_records(
    &self,
    table: StatsTable,
    aggregation_id: i64,
  ) -> Result<Vec<AccumulatorRecord>> {
    let name = table.name();
    let (heads, raw_metrics) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT human_id, games, total_in_rank, first_game_id, last_game_id
           FROM scope_stats WHERE table_name = ?1 AND aggregation_id = ?2
           ORDER BY human_id",
        )?;
        let heads = stmt
          .query_map(rusqlite::params![name, aggregation_id], |row| {
            Ok(AccumulatorRecord {
              human_id:      row.get(0)?,
              games:         row.get(1)?,
              metrics:       Vec::new(),
              total_in_rank: row.get(2)?,
              first_game_id: row.get(3)?,
              last_game_id:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT human_id, metric, value, rank
           FROM scope_stat_metrics WHERE table_name = ?1 AND aggregation_id = ?2",
        )?;
        let raw_metrics = stmt
          .query_map(rusqlite::params![name, aggregation_id], |row| {
            Ok(RawMetric {
              human_id: row.get(0)?,
              metric:   row.get(1)?,
              value:    row.get(2)?,
              rank:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((heads, raw_metrics))
      })
      .await?;

    let mut by_human: HashMap<HumanId, Vec<MetricValue>> = HashMap::new();
    for raw in raw_metrics {
      by_human.entry(raw.human_id).or_default().push(MetricValue {
        metric: decode_metric(&raw.metric)?,
        value:  raw.value,
        rank:   raw.rank,
      });
    }

    let order = table.kind.metrics();
    let position = |m: &MetricValue| order.iter().position(|o| *o == m.metric);
    Ok(
      heads
        .into_iter()
        .map(|mut record| {
          let mut metrics = by_human.remove(&record.human_id).unwrap_or_default();
          metrics.sort_by_key(|m| position(m));
          record.metrics = metrics;
          record
        })
        .collect(),
    )
  }

  // ── Per-game tables ───────────────────────────────────────────────────────

  async fn delete_skater_lines(
    &self,
    since: Option<NaiveDateTime>,
    human_id: Option<HumanId>,
  ) -> Result<usize> {
    self.delete_lines("game_stats_skater", since, human_id).await
  }

  async fn delete_goalie_lines(
    &self,
    since: Option<NaiveDateTime>,
    human_id: Option<HumanId>,
  ) -> Result<usize> {
    self.delete_lines("game_stats_goalie", since, human_id).await
  }

  async fn insert_skater_lines(&self, lines: Vec<SkaterLine>) -> Result<()> {
    let stamp = created_at();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(&format!(
            "INSERT INTO game_stats_skater ({SKATER_LINE_COLUMNS}, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ))?;
          for l in &lines {
            stmt.execute(rusqlite::params![
              l.game_id,
              l.human_id,
              l.team_id,
              l.org_id,
              l.level_id,
              encode_date(l.starts_at),
              encode_time(l.starts_at),
              l.goals,
              l.assists,
              l.points,
              l.penalty_minutes,
              stamp,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_goalie_lines(&self, lines: Vec<GoalieLine>) -> Result<()> {
    let stamp = created_at();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(&format!(
            "INSERT INTO game_stats_goalie ({GOALIE_LINE_COLUMNS}, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ))?;
          for l in &lines {
            stmt.execute(rusqlite::params![
              l.game_id,
              l.human_id,
              l.team_id,
              l.org_id,
              l.level_id,
              encode_date(l.starts_at),
              encode_time(l.starts_at),
              l.goals_allowed,
              l.shots_faced,
              l.saves,
              l.save_percentage,
              stamp,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_skater_lines(&self) -> Result<Vec<SkaterLine>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SKATER_LINE_COLUMNS} FROM game_stats_skater
           WHERE game_id != ?1 ORDER BY game_id, human_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![SENTINEL_GAME_ID], |row| {
            Ok(RawSkaterLine {
              game_id:         row.get(0)?,
              human_id:        row.get(1)?,
              team_id:         row.get(2)?,
              org_id:          row.get(3)?,
              level_id:        row.get(4)?,
              game_date:       row.get(5)?,
              game_time:       row.get(6)?,
              goals:           row.get(7)?,
              assists:         row.get(8)?,
              points:          row.get(9)?,
              penalty_minutes: row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSkaterLine::into_line).collect()
  }

  async fn load_goalie_lines(&self) -> Result<Vec<GoalieLine>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GOALIE_LINE_COLUMNS} FROM game_stats_goalie
           WHERE game_id != ?1 ORDER BY game_id, human_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![SENTINEL_GAME_ID], |row| {
            Ok(RawGoalieLine {
              game_id:         row.get(0)?,
              human_id:        row.get(1)?,
              team_id:         row.get(2)?,
              org_id:          row.get(3)?,
              level_id:        row.get(4)?,
              game_date:       row.get(5)?,
              game_time:       row.get(6)?,
              goals_allowed:   row.get(7)?,
              shots_faced:     row.get(8)?,
              saves:           row.get(9)?,
              save_percentage: row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGoalieLine::into_line).collect()
  }

  // ── Watermark ─────────────────────────────────────────────────────────────

  async fn read_watermark(&self, anchor: HumanId) -> Result<Option<NaiveDateTime>> {
    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT game_date, game_time FROM game_stats_skater
             WHERE game_id = ?1 AND human_id = ?2",
            rusqlite::params![SENTINEL_GAME_ID, anchor],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw
      .map(|(date, time)| -> Result<NaiveDateTime> {
        Ok(decode_date(&date)?.and_time(decode_time(&time)?))
      })
      .transpose()
  }

  async fn write_watermark(&self, anchor: HumanId, at: NaiveDateTime) -> Result<()> {
    let (date, time, stamp) = (encode_date(at), encode_time(at), created_at());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO game_stats_skater
             (game_id, human_id, team_id, org_id, level_id, game_date, game_time,
              goals, assists, points, penalty_minutes, created_at)
           VALUES (?1, ?2, -1, -1, -1, ?3, ?4, 0, 0, 0, 0, ?5)
           ON CONFLICT (game_id, human_id)
           DO UPDATE SET game_date = excluded.game_date, game_time = excluded.game_time",
          rusqlite::params![SENTINEL_GAME_ID, anchor, date, time, stamp],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl SqliteStore {
  /// Shared body of the per-game deletes; the sentinel row always survives.
  async fn delete_lines(
    &self,
    table: &'static str,
    since: Option<NaiveDateTime>,
    human_id: Option<HumanId>,
  ) -> Result<usize> {
    let since = since.map(encode_dt);
    let deleted = self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          &format!(
            "DELETE FROM {table}
             WHERE game_id != ?1
               AND (?2 IS NULL OR (game_date || ' ' || substr(game_time || ':00', 1, 8)) >= ?2)
               AND (?3 IS NULL OR human_id = ?3)"
          ),
          rusqlite::params![SENTINEL_GAME_ID, since, human_id],
        )?;
        Ok(deleted)
      })
      .await?;
    Ok(deleted)
  }
}
