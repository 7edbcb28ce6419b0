//! Error type for `rinkstat-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A metric column holds a name this build does not know.
  #[error("unknown metric in stats table: {0:?}")]
  UnknownMetric(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
