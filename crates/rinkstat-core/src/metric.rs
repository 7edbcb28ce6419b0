//! Subject kinds and the metric-direction table for each of them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// The role a subject is aggregated under.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
  Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubjectKind {
  Skater,
  Goalie,
  Referee,
  Scorekeeper,
  /// Every role a human played, counted together.
  Human,
}

impl SubjectKind {
  pub const ALL: [SubjectKind; 5] = [
    Self::Skater,
    Self::Goalie,
    Self::Referee,
    Self::Scorekeeper,
    Self::Human,
  ];

  /// Metrics tracked for this kind, in storage order. Every one gets its own
  /// rank.
  pub fn metrics(self) -> &'static [Metric] {
    use Metric::*;
    match self {
      Self::Skater => &[
        GamesPlayed,
        Goals,
        Assists,
        Points,
        Penalties,
        GmPenalties,
        PenaltyMinutes,
        GoalsPerGame,
        AssistsPerGame,
        PointsPerGame,
        PenaltiesPerGame,
        GmPenaltiesPerGame,
      ],
      Self::Goalie => &[
        GamesPlayed,
        GoalsAllowed,
        ShotsFaced,
        GoalsAllowedPerGame,
        SavePercentage,
      ],
      Self::Referee => &[
        GamesReffed,
        PenaltiesGiven,
        PenaltiesPerGame,
        GmGiven,
        GmPerGame,
      ],
      Self::Scorekeeper => &[GamesRecorded, SogGiven, SogPerGame],
      Self::Human => &[
        GamesTotal,
        GamesSkater,
        GamesGoalie,
        GamesReferee,
        GamesScorekeeper,
      ],
    }
  }
}

/// Sort direction used when ranking a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  /// Higher is better; the largest value gets rank 1.
  Descending,
  /// Lower is better; the smallest value gets rank 1.
  Ascending,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
  Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
  // ── skater ───────────────────────────────────────────────────────────────
  GamesPlayed,
  Goals,
  Assists,
  Points,
  Penalties,
  GmPenalties,
  PenaltyMinutes,
  GoalsPerGame,
  AssistsPerGame,
  PointsPerGame,
  PenaltiesPerGame,
  GmPenaltiesPerGame,

  // ── goalie ───────────────────────────────────────────────────────────────
  GoalsAllowed,
  ShotsFaced,
  GoalsAllowedPerGame,
  SavePercentage,

  // ── referee ──────────────────────────────────────────────────────────────
  GamesReffed,
  PenaltiesGiven,
  GmGiven,
  GmPerGame,

  // ── scorekeeper ──────────────────────────────────────────────────────────
  GamesRecorded,
  SogGiven,
  SogPerGame,

  // ── human composite ──────────────────────────────────────────────────────
  GamesTotal,
  GamesSkater,
  GamesGoalie,
  GamesReferee,
  GamesScorekeeper,
}

impl Metric {
  pub fn direction(self) -> Direction {
    match self {
      Self::GoalsAllowed | Self::GoalsAllowedPerGame => Direction::Ascending,
      _ => Direction::Descending,
    }
  }
}
