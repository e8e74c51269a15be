//! Aggregate arithmetic.
//!
//! An aggregate is a materialised view over the answer set: for every
//! (room, scenario) pair, `yes` equals the number of current `yes` answers and
//! `no` the number of current `no` answers. Backends keep it in sync
//! incrementally by applying the [`Delta`] of each answer [`Transition`] as a
//! single atomic add-then-floor-at-zero step.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::answer::{AnswerValue, ScenarioId};

// ─── Transition ──────────────────────────────────────────────────────────────

/// What one answer mutation did to a (session, room, scenario) triple.
/// `None` on either side means "no answer".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub previous: Option<AnswerValue>,
  pub next:     Option<AnswerValue>,
}

impl Transition {
  pub fn new(previous: Option<AnswerValue>, next: Option<AnswerValue>) -> Self {
    Self { previous, next }
  }

  pub fn delta(&self) -> Delta { Delta::between(self.previous, self.next) }
}

// ─── Delta ───────────────────────────────────────────────────────────────────

/// Signed change to apply to an aggregate row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
  pub yes: i64,
  pub no:  i64,
}

impl Delta {
  /// Retract the previous answer, then count the next one.
  pub fn between(
    previous: Option<AnswerValue>,
    next: Option<AnswerValue>,
  ) -> Self {
    let mut delta = Self::default();
    match previous {
      Some(AnswerValue::Yes) => delta.yes -= 1,
      Some(AnswerValue::No) => delta.no -= 1,
      None => {}
    }
    match next {
      Some(AnswerValue::Yes) => delta.yes += 1,
      Some(AnswerValue::No) => delta.no += 1,
      None => {}
    }
    delta
  }

  pub fn is_zero(&self) -> bool { self.yes == 0 && self.no == 0 }
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Yes/no counts for one scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
  pub yes: u64,
  pub no:  u64,
}

impl Tally {
  pub fn new(yes: u64, no: u64) -> Self { Self { yes, no } }

  /// Apply `delta`, flooring each counter at zero.
  pub fn apply(self, delta: Delta) -> Self {
    Self {
      yes: self.yes.saturating_add_signed(delta.yes),
      no:  self.no.saturating_add_signed(delta.no),
    }
  }

  pub fn total(&self) -> u64 { self.yes + self.no }

  /// Share of `yes` answers as a whole percentage, rounded half up.
  pub fn yes_percent(&self) -> u8 { percent(self.yes, self.total()) }

  pub fn no_percent(&self) -> u8 { percent(self.no, self.total()) }
}

impl std::ops::Add for Tally {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self { yes: self.yes + rhs.yes, no: self.no + rhs.no }
  }
}

fn percent(part: u64, total: u64) -> u8 {
  if total == 0 {
    return 0;
  }
  ((part * 100 + total / 2) / total) as u8
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Read model served to the results screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
  pub aggregates:         BTreeMap<ScenarioId, Tally>,
  /// Distinct sessions with at least one answer in scope. A session that
  /// answered three scenarios counts once.
  pub total_participants: u64,
}
