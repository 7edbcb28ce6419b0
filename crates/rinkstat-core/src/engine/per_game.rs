//! Per-game skater and goalie lines, maintained incrementally.
//!
//! The per-game skater table carries one sentinel row (game id `-1`, owned by
//! the configured anchor human) whose timestamp is the start of the latest
//! game processed. An append run re-derives everything from one day before
//! that watermark, so late corrections to the most recent games are picked
//! up. Both roles share the watermark; only the skater pipeline moves it,
//! always to the latest game it just processed, so a full run repairs a
//! watermark left by a game that is no longer final.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{error, info, instrument, warn};

use super::{Outcome, exclusions};
use crate::{
  Error, Result,
  aggregate::{Exclusions, goalie, skater},
  config::EngineConfig,
  event::{HumanId, Population},
  materialize::{self, LineRange, Written},
  scope::GameFilter,
  store::StatsStore,
};

/// How far before the watermark an append run re-derives lines.
pub const APPEND_OVERLAP_DAYS: i64 = 1;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Mode {
  /// Rebuild every line.
  #[default]
  Full,
  /// Rebuild only lines inside the overlap window.
  Append,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
  Skater,
  Goalie,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoleSelection {
  Skater,
  Goalie,
  #[default]
  All,
}

impl RoleSelection {
  /// Roles in execution order. Skater runs first since it owns the
  /// watermark.
  pub fn roles(self) -> &'static [Role] {
    match self {
      Self::Skater => &[Role::Skater],
      Self::Goalie => &[Role::Goalie],
      Self::All => &[Role::Skater, Role::Goalie],
    }
  }
}

// ─── Watermark ───────────────────────────────────────────────────────────────

/// The sentinel row's owner and the timestamp it held when the run began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
  pub anchor: HumanId,
  pub at:     Option<NaiveDateTime>,
}

impl Watermark {
  /// Start of the overlap window for an append run.
  pub fn append_start(&self) -> Option<NaiveDateTime> {
    self.at.map(|at| at - Duration::days(APPEND_OVERLAP_DAYS))
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSummary {
  pub written:     Written,
  /// Start of the latest game in the processed population.
  pub latest_game: Option<NaiveDateTime>,
}

pub type RoleOutcome = Outcome<Role, RoleSummary>;

#[derive(Debug)]
pub struct RunReport {
  /// `Full` when an append run had no watermark to start from.
  pub effective_mode: Mode,
  pub roles:          Vec<RoleOutcome>,
  /// The watermark after the run.
  pub watermark:      Option<NaiveDateTime>,
  /// The run ended early because the requested human does not exist.
  pub skipped:        bool,
}

impl RunReport {
  pub fn failed(&self) -> bool { self.roles.iter().any(Outcome::failed) }

  fn skipped(mode: Mode) -> Self {
    Self { effective_mode: mode, roles: Vec::new(), watermark: None, skipped: true }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct GameStatsEngine<'a, S> {
  store:  &'a S,
  config: &'a EngineConfig,
}

impl<'a, S: StatsStore> GameStatsEngine<'a, S> {
  pub fn new(store: &'a S, config: &'a EngineConfig) -> Self { Self { store, config } }

  /// Look up the sentinel anchor and read its watermark. A missing anchor
  /// is fatal: without it nothing can be tracked.
  pub async fn watermark(&self) -> Result<Watermark> {
    let anchor_name = &self.config.sentinel_anchor;
    let ids = self
      .store
      .human_ids_by_names(std::slice::from_ref(anchor_name))
      .await
      .map_err(Error::store)?;
    let anchor = ids
      .first()
      .copied()
      .ok_or_else(|| Error::MissingSentinelAnchor(anchor_name.to_string()))?;

    let at = self.store.read_watermark(anchor).await.map_err(Error::store)?;
    Ok(Watermark { anchor, at })
  }

  /// Process the selected roles.
  ///
  /// `human_id` restricts the run to one human's lines and leaves the
  /// watermark alone. An unknown `human_id` ends the run early.
  #[instrument(skip(self))]
  pub async fn run(
    &self,
    mode: Mode,
    selection: RoleSelection,
    human_id: Option<HumanId>,
  ) -> Result<RunReport> {
    let watermark = self.watermark().await?;

    if let Some(id) = human_id {
      match self.store.get_human(id).await.map_err(Error::store)? {
        Some(human) => info!(human_id = id, name = %human.name, "limiting run to one human"),
        None => {
          warn!(human_id = id, "human not found; nothing to do");
          return Ok(RunReport::skipped(mode));
        }
      }
    }

    let since = match (mode, watermark.append_start()) {
      (Mode::Append, Some(start)) => Some(start),
      (Mode::Append, None) => {
        info!("no watermark yet; falling back to full mode");
        None
      }
      (Mode::Full, _) => None,
    };
    let effective_mode = if since.is_some() { Mode::Append } else { Mode::Full };

    let population = self
      .store
      .load_population(&GameFilter::since(since))
      .await
      .map_err(Error::store)?;
    info!(
      mode = %effective_mode,
      since = ?since,
      games = population.games.len(),
      "loaded eligible games"
    );

    let exclusions = exclusions(self.store, &self.config.excluded_names).await?;
    let range = LineRange { since, human_id };
    let mut report = RunReport {
      effective_mode,
      roles: Vec::new(),
      watermark: watermark.at,
      skipped: false,
    };

    for &role in selection.roles() {
      let mut result = self.run_role(role, &population, &exclusions, range).await;

      // The watermark belongs to the skater outcome: failing to write it
      // fails that role and nothing else.
      let latest = result.as_ref().ok().and_then(|summary| summary.latest_game);
      if role == Role::Skater
        && human_id.is_none()
        && let Some(at) = latest
      {
        match self.store.write_watermark(watermark.anchor, at).await {
          Ok(()) => {
            info!(watermark = %at, "watermark moved");
            report.watermark = Some(at);
          }
          Err(err) => result = Err(Error::store(err)),
        }
      }

      match result {
        Ok(summary) => report.roles.push(Outcome { unit: role, result: Ok(summary) }),
        Err(err) if selection == RoleSelection::All => {
          error!(%role, error = %err, "role failed; continuing with the next");
          report.roles.push(Outcome { unit: role, result: Err(err) });
        }
        Err(err) => return Err(err),
      }
    }

    Ok(report)
  }

  async fn run_role(
    &self,
    role: Role,
    population: &Population,
    exclusions: &Exclusions,
    range: LineRange,
  ) -> Result<RoleSummary> {
    let latest_game = population.latest_start();

    // Nothing new since the watermark: leave the table untouched.
    if range.since.is_some() && population.is_empty() {
      info!(%role, "no games in the overlap window");
      return Ok(RoleSummary { written: Written::default(), latest_game });
    }

    let batch_size = self.config.batch_size;
    let written = match role {
      Role::Skater => {
        let lines = skater::lines(population, exclusions, range.human_id);
        materialize::persist_skater_lines(self.store, range, lines, batch_size).await?
      }
      Role::Goalie => {
        let lines = goalie::lines(population, exclusions, range.human_id);
        materialize::persist_goalie_lines(self.store, range, lines, batch_size).await?
      }
    };

    info!(
      %role,
      deleted = written.deleted,
      inserted = written.inserted,
      "per-game lines materialised"
    );
    Ok(RoleSummary { written, latest_game })
  }
}
