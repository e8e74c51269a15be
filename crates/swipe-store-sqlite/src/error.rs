//! Error type for `swipe-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value outside its domain.
  #[error("corrupt column {column}: {value:?}")]
  Corrupt { column: &'static str, value: String },

  #[error("no free room code after {0} attempts")]
  RoomCodeExhausted(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
