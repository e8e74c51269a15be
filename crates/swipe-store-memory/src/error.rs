//! Error type for `swipe-store-memory`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// An answer referenced a room this store has never created.
  #[error("unknown room {0}")]
  UnknownRoom(Uuid),

  #[error("no free room code after {0} attempts")]
  RoomCodeExhausted(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
