//! The storage traits and the plain records that cross them.
//!
//! Storage backends (e.g. `rinkstat-store-sqlite`) implement both traits. The
//! engine only ever reads through [`EventStore`] and only ever writes through
//! [`StatsStore`].

use std::future::Future;

use chrono::NaiveDateTime;

use crate::{
  event::{Human, HumanId, PersonName, Population},
  record::{AccumulatorRecord, GoalieLine, SkaterLine},
  scope::{GameFilter, StatsTable},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Read access to the raw event tables filled by the ingestion pipeline.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a human by id. Returns `None` if not found.
  fn get_human(
    &self,
    id: HumanId,
  ) -> impl Future<Output = Result<Option<Human>, Self::Error>> + Send + '_;

  /// Resolve names to ids. Names with no match are silently skipped; a name
  /// shared by several humans yields all of them.
  fn human_ids_by_names<'a>(
    &'a self,
    names: &'a [PersonName],
  ) -> impl Future<Output = Result<Vec<HumanId>, Self::Error>> + Send + 'a;

  fn list_org_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  fn list_division_ids(
    &self,
    org_id: i64,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  /// Distinct non-null level ids referenced by divisions.
  fn list_level_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  /// Start of the latest final game matching `filter`, or `None` when no
  /// game matches.
  fn latest_final_game<'a>(
    &'a self,
    filter: &'a GameFilter,
  ) -> impl Future<Output = Result<Option<NaiveDateTime>, Self::Error>> + Send + 'a;

  /// Every final game matching `filter`, with its roster, goals, penalties
  /// and goalie save records.
  fn load_population<'a>(
    &'a self,
    filter: &'a GameFilter,
  ) -> impl Future<Output = Result<Population, Self::Error>> + Send + 'a;
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Owner of the materialised stats tables. The engine is their sole writer.
pub trait StatsStore: EventStore {
  // ── Scope tables ──────────────────────────────────────────────────────

  /// Delete every record of one `(table, aggregation_id)` partition and
  /// return how many were removed.
  fn delete_scope_partition(
    &self,
    table: StatsTable,
    aggregation_id: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert records into a partition as a single transaction.
  fn insert_scope_records(
    &self,
    table: StatsTable,
    aggregation_id: i64,
    records: Vec<AccumulatorRecord>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Read a partition back, ordered by human id.
  fn load_scope_records(
    &self,
    table: StatsTable,
    aggregation_id: i64,
  ) -> impl Future<Output = Result<Vec<AccumulatorRecord>, Self::Error>> + Send + '_;

  // ── Per-game tables ───────────────────────────────────────────────────

  /// Delete per-game lines (never the sentinel row), optionally restricted
  /// to games starting at or after `since` and to one human.
  fn delete_skater_lines(
    &self,
    since: Option<NaiveDateTime>,
    human_id: Option<HumanId>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn delete_goalie_lines(
    &self,
    since: Option<NaiveDateTime>,
    human_id: Option<HumanId>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert lines as a single transaction.
  fn insert_skater_lines(
    &self,
    lines: Vec<SkaterLine>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_goalie_lines(
    &self,
    lines: Vec<GoalieLine>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every per-game skater line except the sentinel, ordered by game then
  /// human.
  fn load_skater_lines(
    &self,
  ) -> impl Future<Output = Result<Vec<SkaterLine>, Self::Error>> + Send + '_;

  fn load_goalie_lines(
    &self,
  ) -> impl Future<Output = Result<Vec<GoalieLine>, Self::Error>> + Send + '_;

  // ── Watermark ─────────────────────────────────────────────────────────

  /// The timestamp held by the sentinel row owned by `anchor`.
  fn read_watermark(
    &self,
    anchor: HumanId,
  ) -> impl Future<Output = Result<Option<NaiveDateTime>, Self::Error>> + Send + '_;

  /// Create or update the sentinel row owned by `anchor`.
  fn write_watermark(
    &self,
    anchor: HumanId,
    at: NaiveDateTime,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
