//! rinkstat binary.
//!
//! Reads `rinkstat.toml` (or the path given with `--config`), opens the
//! SQLite store and runs one of the two pipelines:
//!
//! ```
//! rinkstat scopes --kind skater --axis division --id 10 --window weekly
//! rinkstat per-game --mode append --role all
//! ```
//!
//! Any setting can also come from the environment, e.g.
//! `RINKSTAT_STORE_PATH` or `RINKSTAT_ENGINE__BATCH_SIZE`.

use std::{
  path::{Path, PathBuf},
  str::FromStr,
};

use anyhow::Context as _;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use rinkstat_core::{
  Error as CoreError,
  config::EngineConfig,
  engine::{GameStatsEngine, Mode, RoleSelection, ScopeAggregator},
  event::HumanId,
  metric::SubjectKind,
  scope::Scope,
};
use rinkstat_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hockey stats aggregation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "RINKSTAT_CONFIG", default_value = "rinkstat.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Aggregate and rank per-scope stats tables.
  Scopes {
    /// skater, goalie, referee, scorekeeper, human, or all.
    #[arg(long, default_value = "all")]
    kind:        String,
    /// Run a single scope instead of the full sweep.
    #[arg(long, requires = "id")]
    axis:        Option<String>,
    #[arg(long, requires = "axis")]
    id:          Option<i64>,
    /// all, weekly or daily. Only used with --axis.
    #[arg(long, default_value = "all")]
    window:      String,
    /// Log this human's computed record in every scope.
    #[arg(long)]
    debug_human: Option<HumanId>,
    /// Measure the level look-back from this instant (`YYYY-MM-DD HH:MM:SS`).
    #[arg(long, value_parser = parse_instant)]
    as_of:       Option<NaiveDateTime>,
  },

  /// Rebuild or extend the per-game skater and goalie lines.
  PerGame {
    #[arg(long, default_value = "full")]
    mode:     Mode,
    /// skater, goalie, or all.
    #[arg(long, default_value = "all")]
    role:     RoleSelection,
    /// Restrict the run to one human.
    #[arg(long)]
    human_id: Option<HumanId>,
  },
}

#[derive(Debug, Deserialize)]
struct CliConfig {
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
  #[serde(default)]
  engine:     EngineConfig,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/rinkstat/hockey.db") }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("RINKSTAT")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Scopes { kind, axis, id, window, debug_human, as_of } => {
      let kinds = parse_kinds(&kind)?;
      let mut aggregator = ScopeAggregator::new(&store, &cfg.engine);
      if let Some(now) = as_of {
        aggregator = aggregator.as_of(now);
      }

      let report = match (axis, id) {
        (Some(axis), Some(id)) => {
          let scope = Scope::parse(&axis, id, &window)?;
          aggregator.run_scopes(&kinds, &[scope], debug_human).await?
        }
        _ => aggregator.sweep(&kinds, debug_human).await?,
      };

      for outcome in &report.kinds {
        match &outcome.result {
          Ok(runs) => {
            let inserted: usize = runs.iter().map(|r| r.written.inserted).sum();
            tracing::info!(kind = %outcome.unit, scopes = runs.len(), inserted, "done");
          }
          Err(err) => tracing::error!(kind = %outcome.unit, error = %err, "failed"),
        }
      }
      if report.failed() {
        anyhow::bail!("one or more subject kinds failed");
      }
    }

    Command::PerGame { mode, role, human_id } => {
      let report = GameStatsEngine::new(&store, &cfg.engine)
        .run(mode, role, human_id)
        .await?;

      if report.skipped {
        return Ok(());
      }
      for outcome in &report.roles {
        match &outcome.result {
          Ok(summary) => tracing::info!(
            role = %outcome.unit,
            mode = %report.effective_mode,
            deleted = summary.written.deleted,
            inserted = summary.written.inserted,
            "done"
          ),
          Err(err) => tracing::error!(role = %outcome.unit, error = %err, "failed"),
        }
      }
      if report.failed() {
        anyhow::bail!("one or more roles failed");
      }
    }
  }

  Ok(())
}

/// `all` or a single subject kind.
fn parse_kinds(raw: &str) -> Result<Vec<SubjectKind>, CoreError> {
  if raw.eq_ignore_ascii_case("all") {
    return Ok(SubjectKind::ALL.to_vec());
  }
  SubjectKind::from_str(raw)
    .map(|kind| vec![kind])
    .map_err(|_| CoreError::UnknownSubjectKind(raw.to_owned()))
}

fn parse_instant(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
  NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
