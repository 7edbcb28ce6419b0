//! Orchestration: the scope aggregator and the per-game append engine, each
//! wiring the pure stages to a [`StatsStore`](crate::store::StatsStore).

pub mod per_game;
pub mod scope;

pub use per_game::{GameStatsEngine, Mode, Role, RoleSelection, RunReport};
pub use scope::{ScopeAggregator, SweepReport};

use tracing::debug;

use crate::{
  Error, Result, aggregate::Exclusions, event::PersonName, store::EventStore,
};

/// Resolve configured placeholder names to the humans they exclude.
pub(crate) async fn exclusions<S: EventStore>(
  store: &S,
  names: &[PersonName],
) -> Result<Exclusions> {
  let ids = store.human_ids_by_names(names).await.map_err(Error::store)?;
  debug!(names = names.len(), humans = ids.len(), "resolved excluded humans");
  Ok(ids.into_iter().collect())
}

/// Outcome of one independently failing unit of work (a role, a kind).
#[derive(Debug)]
pub struct Outcome<K, T> {
  pub unit:   K,
  pub result: Result<T>,
}

impl<K, T> Outcome<K, T> {
  pub fn failed(&self) -> bool { self.result.is_err() }
}
