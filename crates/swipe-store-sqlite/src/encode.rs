//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings,
//! answer values the literal `yes` / `no`, booleans `0` / `1`.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use swipe_core::{
  answer::{Answer, AnswerValue, ScenarioId, SessionId},
  room::Room,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── AnswerValue ─────────────────────────────────────────────────────────────

pub fn decode_answer(s: &str) -> Result<AnswerValue> {
  AnswerValue::from_str(s).map_err(|_| Error::Corrupt {
    column: "answers.value",
    value:  s.to_owned(),
  })
}

/// Read an answer value column inside a `tokio_rusqlite` closure, where
/// failures must be expressed as [`rusqlite::Error`].
pub fn answer_column(
  row: &rusqlite::Row<'_>,
  idx: usize,
) -> rusqlite::Result<AnswerValue> {
  let raw: String = row.get(idx)?;
  AnswerValue::from_str(&raw).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(
      idx,
      rusqlite::types::Type::Text,
      Box::new(e),
    )
  })
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// SQLite integers are signed; the schema's CHECK keeps counters non-negative.
pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `rooms` row.
pub struct RawRoom {
  pub id:         String,
  pub code:       String,
  pub title:      String,
  pub set_id:     String,
  pub is_active:  bool,
  pub created_at: String,
  pub closed_at:  Option<String>,
}

/// Column list matching [`RawRoom::from_row`].
pub const ROOM_COLUMNS: &str =
  "id, code, title, set_id, is_active, created_at, closed_at";

impl RawRoom {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      code:       row.get(1)?,
      title:      row.get(2)?,
      set_id:     row.get(3)?,
      is_active:  row.get(4)?,
      created_at: row.get(5)?,
      closed_at:  row.get(6)?,
    })
  }

  pub fn into_room(self) -> Result<Room> {
    Ok(Room {
      id:         decode_uuid(&self.id)?,
      code:       self.code,
      title:      self.title,
      set_id:     self.set_id,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
      closed_at:  self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from an `answers` row.
pub struct RawAnswer {
  pub session_id:  String,
  pub room_id:     String,
  pub scenario_id: String,
  pub value:       String,
  pub answered_at: String,
}

impl RawAnswer {
  pub fn into_answer(self) -> Result<Answer> {
    let corrupt = |column: &'static str, value: &str| Error::Corrupt {
      column,
      value: value.to_owned(),
    };
    Ok(Answer {
      session_id:  SessionId::parse(&self.session_id)
        .map_err(|_| corrupt("answers.session_id", &self.session_id))?,
      room_id:     decode_uuid(&self.room_id)?,
      scenario_id: ScenarioId::parse(&self.scenario_id)
        .map_err(|_| corrupt("answers.scenario_id", &self.scenario_id))?,
      value:       decode_answer(&self.value)?,
      answered_at: decode_dt(&self.answered_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_answer_value_is_corrupt() {
    assert!(matches!(
      decode_answer("maybe"),
      Err(Error::Corrupt { column: "answers.value", .. })
    ));
    assert_eq!(decode_answer("yes").unwrap(), AnswerValue::Yes);
  }

  #[test]
  fn negative_counts_decode_as_zero() {
    assert_eq!(decode_count(-2), 0);
    assert_eq!(decode_count(7), 7);
  }

  #[test]
  fn dt_roundtrip_preserves_instant() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }
}
