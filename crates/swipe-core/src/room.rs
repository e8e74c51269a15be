//! Rooms — the multiplayer scope that answers and aggregates belong to.
//!
//! A room is a plain content record. The aggregation core only needs to know
//! that a room exists and whether it still accepts answers.

use chrono::{DateTime, Utc};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Characters used in room codes; `I`, `O`, `0` and `1` are left out so codes
/// survive being read aloud.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 6;

/// How many fresh codes a backend tries before giving up on a collision.
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// Scenario set assigned to rooms created without one.
pub const DEFAULT_SET_ID: &str = "default";

pub const MAX_TITLE_LEN: usize = 200;

// ─── Room ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
  pub id:         Uuid,
  /// Short human-entered code, always upper case.
  pub code:       String,
  pub title:      String,
  pub set_id:     String,
  /// Closed rooms stay readable but reject new answers.
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
  pub closed_at:  Option<DateTime<Utc>>,
}

impl Room {
  /// Apply an update in place. `closed_at` is stamped on the open → closed
  /// transition only and cleared on reopening.
  pub fn apply(&mut self, update: &RoomUpdate, now: DateTime<Utc>) {
    if let Some(title) = &update.title {
      self.title = title.clone();
    }
    if let Some(active) = update.is_active {
      if active {
        self.closed_at = None;
      } else if self.is_active {
        self.closed_at = Some(now);
      }
      self.is_active = active;
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::SwipeStore::create_room`]. The id, code and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRoom {
  pub title:  String,
  pub set_id: String,
}

impl NewRoom {
  pub fn new(title: &str, set_id: Option<&str>) -> Result<Self> {
    let set_id = set_id
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .unwrap_or(DEFAULT_SET_ID);
    Ok(Self { title: validate_title(title)?, set_id: set_id.to_owned() })
  }
}

/// Partial update for [`crate::store::SwipeStore::update_room`].
#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
  pub title:     Option<String>,
  pub is_active: Option<bool>,
}

impl RoomUpdate {
  pub fn new(title: Option<&str>, is_active: Option<bool>) -> Result<Self> {
    Ok(Self { title: title.map(validate_title).transpose()?, is_active })
  }
}

pub fn validate_title(raw: &str) -> Result<String> {
  let title = raw.trim();
  if title.is_empty() {
    return Err(Error::Validation("title is required".to_owned()));
  }
  if title.chars().count() > MAX_TITLE_LEN {
    return Err(Error::Validation(format!(
      "title must be at most {MAX_TITLE_LEN} characters"
    )));
  }
  Ok(title.to_owned())
}

// ─── Codes ───────────────────────────────────────────────────────────────────

/// Draw a fresh room code. The alphabet has 32 symbols, so reducing a `u32`
/// modulo its length is unbiased.
pub fn generate_room_code<R: RngCore + ?Sized>(rng: &mut R) -> String {
  (0..ROOM_CODE_LEN)
    .map(|_| {
      let idx = rng.next_u32() as usize % ROOM_CODE_ALPHABET.len();
      ROOM_CODE_ALPHABET[idx] as char
    })
    .collect()
}

/// Canonical form of a user-entered code.
pub fn normalize_room_code(raw: &str) -> String {
  raw.trim().to_ascii_uppercase()
}
