//! Engine configuration, deserialised from the `[engine]` table of the CLI
//! config file. Every field has a default so an empty file is valid.

use serde::Deserialize;

use crate::{event::PersonName, scope::Axis};

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Rows written per transaction by the materializer.
  #[serde(default = "default_batch_size")]
  pub batch_size:       usize,
  #[serde(default)]
  pub thresholds:       Thresholds,
  /// Placeholder identities (e.g. "Empty Net") that never get stats.
  #[serde(default = "default_excluded_names")]
  pub excluded_names:   Vec<PersonName>,
  /// Human whose per-game skater row carries the append watermark.
  #[serde(default = "default_sentinel_anchor")]
  pub sentinel_anchor:  PersonName,
  /// Also aggregate the all-organizations scope during a sweep.
  #[serde(default)]
  pub include_all_orgs: bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      batch_size:       default_batch_size(),
      thresholds:       Thresholds::default(),
      excluded_names:   default_excluded_names(),
      sentinel_anchor:  default_sentinel_anchor(),
      include_all_orgs: false,
    }
  }
}

/// Minimum games a subject needs before it appears in a scope's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Thresholds {
  #[serde(default = "default_org_min")]
  pub org:      u32,
  #[serde(default = "default_division_min")]
  pub division: u32,
  #[serde(default = "default_level_min")]
  pub level:    u32,
}

impl Thresholds {
  pub fn for_axis(&self, axis: Axis) -> u32 {
    match axis {
      Axis::Organization => self.org,
      Axis::Division => self.division,
      Axis::Level => self.level,
    }
  }
}

impl Default for Thresholds {
  fn default() -> Self {
    Self {
      org:      default_org_min(),
      division: default_division_min(),
      level:    default_level_min(),
    }
  }
}

fn default_batch_size() -> usize { 1000 }

fn default_org_min() -> u32 { 1 }

fn default_division_min() -> u32 { 1 }

fn default_level_min() -> u32 { 3 }

fn default_excluded_names() -> Vec<PersonName> {
  vec![
    PersonName::new("Incognito", "", "Human"),
    PersonName::new("Empty", "", "Net"),
    PersonName::new("Unknown", "", "Player"),
  ]
}

fn default_sentinel_anchor() -> PersonName { PersonName::new("Incognito", "", "Human") }
