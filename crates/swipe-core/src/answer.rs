//! Answers — one yes/no verdict per (session, room, scenario) triple.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest accepted session or scenario identifier, in characters.
pub const MAX_ID_LEN: usize = 128;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Client-generated session identifier, stable across a visit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
  pub fn parse(raw: &str) -> Result<Self> {
    validate_id("sessionId", raw).map(Self)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Identifier of a scenario card. Scenario content lives elsewhere; the
/// aggregation core only ever sees the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

impl ScenarioId {
  pub fn parse(raw: &str) -> Result<Self> {
    validate_id("scenarioId", raw).map(Self)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ScenarioId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

fn validate_id(field: &str, raw: &str) -> Result<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  if trimmed.chars().count() > MAX_ID_LEN {
    return Err(Error::Validation(format!(
      "{field} must be at most {MAX_ID_LEN} characters"
    )));
  }
  Ok(trimmed.to_owned())
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// The verdict on a scenario card. The string forms are exactly `"yes"` and
/// `"no"`, both on the wire and in storage.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnswerValue {
  Yes,
  No,
}

impl AnswerValue {
  /// Parse a user-supplied answer. Case-sensitive.
  pub fn parse(raw: &str) -> Result<Self> {
    raw.parse().map_err(|_| {
      Error::Validation(format!("answer must be \"yes\" or \"no\", got {raw:?}"))
    })
  }
}

// ─── Answer ──────────────────────────────────────────────────────────────────

/// The current answer a session holds for one scenario in one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  pub session_id:  SessionId,
  pub room_id:     Uuid,
  pub scenario_id: ScenarioId,
  pub value:       AnswerValue,
  /// Bumped on every submission, including identical resubmissions.
  pub answered_at: DateTime<Utc>,
}
