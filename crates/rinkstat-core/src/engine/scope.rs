//! Scope aggregation: resolve, aggregate, derive, rank, materialise.

use chrono::{NaiveDateTime, Utc};
use tracing::{error, info, instrument};

use super::{Outcome, exclusions};
use crate::{
  Error, Result,
  aggregate::{
    Exclusions, GoalieTally, HumanTally, RefereeTally, ScorekeeperTally, SkaterTally,
    Tally,
  },
  config::EngineConfig,
  derive,
  event::{HumanId, Population},
  materialize::{self, Written},
  metric::SubjectKind,
  rank,
  scope::{ALL_ORGS_ID, Axis, Scope, StatsTable, Window, resolve},
  store::StatsStore,
};

/// What a single scope run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeRun {
  pub scope:   Scope,
  pub table:   StatsTable,
  /// Final games in the resolved population.
  pub games:   usize,
  pub written: Written,
}

/// Result of a sweep, one entry per subject kind.
#[derive(Debug, Default)]
pub struct SweepReport {
  pub kinds: Vec<Outcome<SubjectKind, Vec<ScopeRun>>>,
}

impl SweepReport {
  pub fn failed(&self) -> bool { self.kinds.iter().any(Outcome::failed) }
}

/// Runs the scope pipeline against a store.
pub struct ScopeAggregator<'a, S> {
  store:  &'a S,
  config: &'a EngineConfig,
  now:    NaiveDateTime,
}

impl<'a, S: StatsStore> ScopeAggregator<'a, S> {
  pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
    Self { store, config, now: Utc::now().naive_utc() }
  }

  /// Pin the instant the level look-back is measured from.
  pub fn as_of(mut self, now: NaiveDateTime) -> Self {
    self.now = now;
    self
  }

  /// Aggregate one scope for one kind and replace its partition.
  ///
  /// With `debug_human`, that human's record (or its absence) is logged.
  #[instrument(skip(self), fields(axis = %scope.axis, id = scope.axis_id, window = %scope.window))]
  pub async fn run_scope(
    &self,
    kind: SubjectKind,
    scope: Scope,
    debug_human: Option<HumanId>,
  ) -> Result<ScopeRun> {
    let exclusions = exclusions(self.store, &self.config.excluded_names).await?;
    self.dispatch(kind, scope, &exclusions, debug_human).await
  }

  /// Every scope a sweep visits: each organization's divisions and the
  /// organization itself in all three windows, then each level all-time,
  /// then optionally all organizations together.
  pub async fn plan(&self) -> Result<Vec<Scope>> {
    let mut scopes = Vec::new();

    for org_id in self.store.list_org_ids().await.map_err(Error::store)? {
      let divisions = self
        .store
        .list_division_ids(org_id)
        .await
        .map_err(Error::store)?;
      for division_id in divisions {
        for window in Window::ALL {
          scopes.push(Scope::new(Axis::Division, division_id, window));
        }
      }
      for window in Window::ALL {
        scopes.push(Scope::new(Axis::Organization, org_id, window));
      }
    }

    for level_id in self.store.list_level_ids().await.map_err(Error::store)? {
      scopes.push(Scope::new(Axis::Level, level_id, Window::AllTime));
    }

    if self.config.include_all_orgs {
      for window in Window::ALL {
        scopes.push(Scope::new(Axis::Organization, ALL_ORGS_ID, window));
      }
    }

    Ok(scopes)
  }

  /// Run every planned scope for each of `kinds`.
  #[instrument(skip(self))]
  pub async fn sweep(
    &self,
    kinds: &[SubjectKind],
    debug_human: Option<HumanId>,
  ) -> Result<SweepReport> {
    let scopes = self.plan().await?;
    self.run_scopes(kinds, &scopes, debug_human).await
  }

  /// Run `scopes` for each of `kinds`.
  ///
  /// With more than one kind, a failing kind is logged and the next one
  /// still runs; with a single kind the error is returned.
  pub async fn run_scopes(
    &self,
    kinds: &[SubjectKind],
    scopes: &[Scope],
    debug_human: Option<HumanId>,
  ) -> Result<SweepReport> {
    let exclusions = exclusions(self.store, &self.config.excluded_names).await?;
    info!(scopes = scopes.len(), kinds = kinds.len(), "aggregating scopes");

    let mut report = SweepReport::default();
    for &kind in kinds {
      let result = self.run_kind(kind, scopes, &exclusions, debug_human).await;
      match result {
        Ok(runs) => {
          info!(%kind, scopes = runs.len(), "kind complete");
          report.kinds.push(Outcome { unit: kind, result: Ok(runs) });
        }
        Err(err) if kinds.len() > 1 => {
          error!(%kind, error = %err, "kind failed; continuing");
          report.kinds.push(Outcome { unit: kind, result: Err(err) });
        }
        Err(err) => return Err(err),
      }
    }
    Ok(report)
  }

  async fn run_kind(
    &self,
    kind: SubjectKind,
    scopes: &[Scope],
    exclusions: &Exclusions,
    debug_human: Option<HumanId>,
  ) -> Result<Vec<ScopeRun>> {
    let mut runs = Vec::with_capacity(scopes.len());
    for &scope in scopes {
      runs.push(self.dispatch(kind, scope, exclusions, debug_human).await?);
    }
    Ok(runs)
  }

  async fn dispatch(
    &self,
    kind: SubjectKind,
    scope: Scope,
    exclusions: &Exclusions,
    debug_human: Option<HumanId>,
  ) -> Result<ScopeRun> {
    match kind {
      SubjectKind::Skater => self.run::<SkaterTally>(scope, exclusions, debug_human).await,
      SubjectKind::Goalie => self.run::<GoalieTally>(scope, exclusions, debug_human).await,
      SubjectKind::Referee => self.run::<RefereeTally>(scope, exclusions, debug_human).await,
      SubjectKind::Scorekeeper => {
        self.run::<ScorekeeperTally>(scope, exclusions, debug_human).await
      }
      SubjectKind::Human => self.run::<HumanTally>(scope, exclusions, debug_human).await,
    }
  }

  async fn run<T: Tally>(
    &self,
    scope: Scope,
    exclusions: &Exclusions,
    debug_human: Option<HumanId>,
  ) -> Result<ScopeRun> {
    let resolved = resolve(self.store, T::KIND, scope, &self.config.thresholds, self.now).await?;

    let population = match &resolved.filter {
      Some(filter) => self.store.load_population(filter).await.map_err(Error::store)?,
      None => Population::default(),
    };

    let tallies = T::aggregate(&population, exclusions);
    let mut records = derive::enrich(tallies, resolved.min_games);
    rank::rank_all(&mut records, T::KIND);

    if let Some(human_id) = debug_human {
      match records.iter().find(|r| r.human_id == human_id) {
        Some(record) => match serde_json::to_string(record) {
          Ok(json) => info!(table = %resolved.table.name(), human_id, record = %json, "debug human"),
          Err(err) => error!(human_id, error = %err, "could not serialise debug record"),
        },
        None => info!(table = %resolved.table.name(), human_id, "debug human has no record in scope"),
      }
    }

    let written = materialize::persist_scope(
      self.store,
      resolved.table,
      scope.axis_id,
      records,
      self.config.batch_size,
    )
    .await?;

    info!(
      table = %resolved.table.name(),
      aggregation_id = scope.axis_id,
      games = population.games.len(),
      deleted = written.deleted,
      inserted = written.inserted,
      "scope materialised"
    );

    Ok(ScopeRun {
      scope,
      table: resolved.table,
      games: population.games.len(),
      written,
    })
  }
}
