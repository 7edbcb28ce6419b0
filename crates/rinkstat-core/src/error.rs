//! Error types for `rinkstat-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown aggregation axis: {0:?}")]
  UnknownAxis(String),

  #[error("unknown aggregation window: {0:?}")]
  UnknownWindow(String),

  #[error("unknown subject kind: {0:?}")]
  UnknownSubjectKind(String),

  /// The human that owns the per-game sentinel row is not in the store.
  #[error("sentinel anchor {0} not found; it is required for watermark tracking")]
  MissingSentinelAnchor(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
