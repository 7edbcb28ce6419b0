//! Writing results: delete the target rows, then insert fresh ones in fixed
//! size batches, each batch its own transaction.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::{
  Error, Result,
  event::HumanId,
  record::{AccumulatorRecord, GoalieLine, SkaterLine},
  scope::StatsTable,
  store::StatsStore,
};

/// Row counts from one materialisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Written {
  pub deleted:  usize,
  pub inserted: usize,
}

/// Replace the `(table, aggregation_id)` partition with `records`.
pub async fn persist_scope<S: StatsStore>(
  store: &S,
  table: StatsTable,
  aggregation_id: i64,
  records: Vec<AccumulatorRecord>,
  batch_size: usize,
) -> Result<Written> {
  let deleted = store
    .delete_scope_partition(table, aggregation_id)
    .await
    .map_err(Error::store)?;

  let inserted = records.len();
  for batch in batches(records, batch_size) {
    debug!(table = %table.name(), aggregation_id, rows = batch.len(), "inserting batch");
    store
      .insert_scope_records(table, aggregation_id, batch)
      .await
      .map_err(Error::store)?;
  }

  Ok(Written { deleted, inserted })
}

/// Which per-game lines to clear before inserting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRange {
  /// Only lines of games starting at or after this instant.
  pub since:    Option<NaiveDateTime>,
  /// Only this human's lines.
  pub human_id: Option<HumanId>,
}

pub async fn persist_skater_lines<S: StatsStore>(
  store: &S,
  range: LineRange,
  lines: Vec<SkaterLine>,
  batch_size: usize,
) -> Result<Written> {
  let deleted = store
    .delete_skater_lines(range.since, range.human_id)
    .await
    .map_err(Error::store)?;

  let inserted = lines.len();
  for batch in batches(lines, batch_size) {
    store.insert_skater_lines(batch).await.map_err(Error::store)?;
  }

  Ok(Written { deleted, inserted })
}

pub async fn persist_goalie_lines<S: StatsStore>(
  store: &S,
  range: LineRange,
  lines: Vec<GoalieLine>,
  batch_size: usize,
) -> Result<Written> {
  let deleted = store
    .delete_goalie_lines(range.since, range.human_id)
    .await
    .map_err(Error::store)?;

  let inserted = lines.len();
  for batch in batches(lines, batch_size) {
    store.insert_goalie_lines(batch).await.map_err(Error::store)?;
  }

  Ok(Written { deleted, inserted })
}

/// Split `rows` into owned chunks of at most `size` (at least 1).
fn batches<T>(rows: Vec<T>, size: usize) -> Vec<Vec<T>> {
  let size = size.max(1);
  let mut out = Vec::with_capacity(rows.len().div_ceil(size));
  let mut rows = rows.into_iter().peekable();
  while rows.peek().is_some() {
    out.push(rows.by_ref().take(size).collect());
  }
  out
}
