//! Scope resolution: turning an (axis, id, window) triple into the event
//! filter, the target table and the minimum-population threshold.

use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  config::Thresholds,
  metric::SubjectKind,
  store::EventStore,
};

/// Organization id meaning "every organization".
pub const ALL_ORGS_ID: i64 = 0;

/// Levels only aggregate games from this many days back, so that skill
/// comparisons stay within the current era.
pub const LEVEL_LOOKBACK_DAYS: i64 = 5 * 365;

// ─── Axis & window ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Axis {
  #[strum(to_string = "org", serialize = "organization")]
  #[serde(rename = "org")]
  Organization,
  #[strum(to_string = "division")]
  Division,
  #[strum(to_string = "level")]
  Level,
}

impl Axis {
  pub fn parse(raw: &str) -> Result<Self> {
    Self::from_str(raw).map_err(|_| Error::UnknownAxis(raw.to_owned()))
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Window {
  #[default]
  #[strum(to_string = "all", serialize = "all_time")]
  AllTime,
  Weekly,
  Daily,
}

impl Window {
  pub const ALL: [Window; 3] = [Self::AllTime, Self::Weekly, Self::Daily];

  pub fn parse(raw: &str) -> Result<Self> {
    Self::from_str(raw).map_err(|_| Error::UnknownWindow(raw.to_owned()))
  }

  /// Length of the trailing window, or `None` for all-time.
  pub fn span(self) -> Option<Duration> {
    match self {
      Self::AllTime => None,
      Self::Weekly => Some(Duration::days(7)),
      Self::Daily => Some(Duration::days(1)),
    }
  }
}

/// An aggregation partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
  pub axis:    Axis,
  pub axis_id: i64,
  pub window:  Window,
}

impl Scope {
  pub fn new(axis: Axis, axis_id: i64, window: Window) -> Self {
    Self { axis, axis_id, window }
  }

  /// Parse a scope from its textual parts; unknown axes or windows are
  /// configuration errors.
  pub fn parse(axis: &str, axis_id: i64, window: &str) -> Result<Self> {
    Ok(Self::new(Axis::parse(axis)?, axis_id, Window::parse(window)?))
  }
}

// ─── Filter predicate ────────────────────────────────────────────────────────

/// Predicate over games. Backends always add "status is final"; every other
/// field narrows the population when set. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
  pub org_id:      Option<i64>,
  pub division_id: Option<i64>,
  pub level_id:    Option<i64>,
  pub starts_from: Option<NaiveDateTime>,
  pub starts_to:   Option<NaiveDateTime>,
}

impl GameFilter {
  /// Every final game.
  pub fn everything() -> Self { Self::default() }

  /// Final games starting at or after `since`.
  pub fn since(since: Option<NaiveDateTime>) -> Self {
    Self { starts_from: since, ..Self::default() }
  }

  /// The axis part of a scope, before any window is applied.
  pub fn for_axis(axis: Axis, axis_id: i64, now: NaiveDateTime) -> Self {
    match axis {
      Axis::Organization if axis_id == ALL_ORGS_ID => Self::everything(),
      Axis::Organization => Self { org_id: Some(axis_id), ..Self::default() },
      Axis::Division => Self { division_id: Some(axis_id), ..Self::default() },
      Axis::Level => Self {
        level_id: Some(axis_id),
        starts_from: Some(now - Duration::days(LEVEL_LOOKBACK_DAYS)),
        ..Self::default()
      },
    }
  }

  /// Narrow to `[from, to]`, keeping any tighter lower bound already set.
  pub fn within(mut self, from: NaiveDateTime, to: NaiveDateTime) -> Self {
    self.starts_from = Some(self.starts_from.map_or(from, |f| f.max(from)));
    self.starts_to = Some(to);
    self
  }
}

// ─── Result table ────────────────────────────────────────────────────────────

/// The logical table a scope's records are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsTable {
  pub kind:   SubjectKind,
  pub axis:   Axis,
  pub window: Window,
}

impl StatsTable {
  /// e.g. `org_stats_skater`, `division_stats_weekly_goalie`.
  pub fn name(&self) -> String {
    match self.window {
      Window::AllTime => format!("{}_stats_{}", self.axis, self.kind),
      window => format!("{}_stats_{}_{}", self.axis, window, self.kind),
    }
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
  pub scope:     Scope,
  /// `None` when the window found no games: the population is empty.
  pub filter:    Option<GameFilter>,
  pub table:     StatsTable,
  pub min_games: u32,
}

/// Resolve `scope` for `kind`. `now` anchors the level look-back.
pub async fn resolve<S: EventStore>(
  store: &S,
  kind: SubjectKind,
  scope: Scope,
  thresholds: &Thresholds,
  now: NaiveDateTime,
) -> Result<ResolvedScope> {
  let axis_filter = GameFilter::for_axis(scope.axis, scope.axis_id, now);

  let filter = match scope.window.span() {
    None => Some(axis_filter),
    Some(span) => store
      .latest_final_game(&axis_filter)
      .await
      .map_err(Error::store)?
      .map(|latest| axis_filter.clone().within(latest - span, latest)),
  };

  Ok(ResolvedScope {
    scope,
    filter,
    table: StatsTable { kind, axis: scope.axis, window: scope.window },
    min_games: thresholds.for_axis(scope.axis),
  })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
  }

  #[test]
  fn unknown_axis_is_a_configuration_error() {
    assert!(matches!(Scope::parse("league", 1, "all"), Err(Error::UnknownAxis(a)) if a == "league"));
    assert!(matches!(Scope::parse("org", 1, "monthly"), Err(Error::UnknownWindow(_))));
  }

  #[test]
  fn axis_and_window_parse_aliases() {
    assert_eq!(Axis::parse("organization").unwrap(), Axis::Organization);
    assert_eq!(Axis::parse("ORG").unwrap(), Axis::Organization);
    assert_eq!(Window::parse("all_time").unwrap(), Window::AllTime);
    assert_eq!(Window::parse("Weekly").unwrap(), Window::Weekly);
  }

  #[test]
  fn table_names_follow_axis_window_kind() {
    let table = StatsTable {
      kind:   SubjectKind::Skater,
      axis:   Axis::Organization,
      window: Window::AllTime,
    };
    assert_eq!(table.name(), "org_stats_skater");

    let table = StatsTable {
      kind:   SubjectKind::Goalie,
      axis:   Axis::Division,
      window: Window::Weekly,
    };
    assert_eq!(table.name(), "division_stats_weekly_goalie");
  }

  #[test]
  fn all_orgs_applies_no_org_filter() {
    let now = at(2025, 6, 1);
    assert_eq!(GameFilter::for_axis(Axis::Organization, ALL_ORGS_ID, now), GameFilter::everything());
    assert_eq!(GameFilter::for_axis(Axis::Organization, 4, now).org_id, Some(4));
  }

  #[test]
  fn level_looks_back_five_years() {
    let now = at(2025, 6, 1);
    let filter = GameFilter::for_axis(Axis::Level, 2, now);
    assert_eq!(filter.level_id, Some(2));
    assert_eq!(filter.starts_from, Some(now - Duration::days(5 * 365)));
  }

  #[test]
  fn window_keeps_tighter_lower_bound() {
    let filter = GameFilter::since(Some(at(2025, 5, 30))).within(at(2025, 5, 25), at(2025, 6, 1));
    assert_eq!(filter.starts_from, Some(at(2025, 5, 30)));
    assert_eq!(filter.starts_to, Some(at(2025, 6, 1)));
  }
}
