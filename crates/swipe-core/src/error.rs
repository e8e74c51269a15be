//! Error types for `swipe-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed input. Never worth retrying.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("room not found")]
  RoomNotFound,

  /// The storage backend failed. Every write is idempotent, so the caller
  /// may retry the whole operation.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Persistence(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
