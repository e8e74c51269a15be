//! [`MemoryStore`] — a `HashMap`-backed implementation of [`SwipeStore`].

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use rand_core::OsRng;
use tokio::sync::Mutex;
use uuid::Uuid;

use swipe_core::{
  answer::{Answer, AnswerValue, ScenarioId, SessionId},
  room::{MAX_CODE_ATTEMPTS, NewRoom, Room, RoomUpdate, generate_room_code},
  store::SwipeStore,
  tally::{Aggregates, Delta, Tally},
};

use crate::{Error, Result};

type AnswerKey = (SessionId, Uuid, ScenarioId);
type AggregateKey = (Uuid, ScenarioId);

#[derive(Default)]
struct State {
  sessions:   HashMap<SessionId, DateTime<Utc>>,
  /// Creation order; `list_rooms` reverses it.
  rooms:      Vec<Room>,
  answers:    HashMap<AnswerKey, Answer>,
  aggregates: HashMap<AggregateKey, Tally>,
}

impl State {
  fn room(&self, id: Uuid) -> Option<&Room> { self.rooms.iter().find(|r| r.id == id) }

  fn touch_session(&mut self, session_id: &SessionId, now: DateTime<Utc>) {
    self.sessions.entry(session_id.clone()).or_insert(now);
  }

  /// Insert-if-absent then apply `delta`, floored at zero.
  fn adjust_aggregate(&mut self, room_id: Uuid, scenario_id: &ScenarioId, delta: Delta) {
    let tally = self
      .aggregates
      .entry((room_id, scenario_id.clone()))
      .or_default();
    *tally = tally.apply(delta);
  }

  fn aggregates_where(&self, in_scope: impl Fn(Uuid) -> bool) -> Aggregates {
    let mut aggregates: BTreeMap<ScenarioId, Tally> = BTreeMap::new();
    for ((room_id, scenario_id), tally) in &self.aggregates {
      if in_scope(*room_id) {
        let entry = aggregates.entry(scenario_id.clone()).or_default();
        *entry = *entry + *tally;
      }
    }

    let participants: HashSet<&SessionId> = self
      .answers
      .keys()
      .filter(|(_, room_id, _)| in_scope(*room_id))
      .map(|(session_id, _, _)| session_id)
      .collect();

    Aggregates { aggregates, total_participants: participants.len() as u64 }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Swipe store held entirely in process memory.
///
/// Cloning is cheap and clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

// ─── SwipeStore impl ─────────────────────────────────────────────────────────

impl SwipeStore for MemoryStore {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn ensure_session(&self, session_id: SessionId) -> Result<()> {
    self.inner.lock().await.touch_session(&session_id, Utc::now());
    Ok(())
  }

  // ── Rooms ─────────────────────────────────────────────────────────────────

  async fn create_room(&self, input: NewRoom) -> Result<Room> {
    let mut state = self.inner.lock().await;

    for _ in 0..MAX_CODE_ATTEMPTS {
      let code = generate_room_code(&mut OsRng);
      if state.rooms.iter().any(|r| r.code == code) {
        tracing::debug!(%code, "room code collision; drawing another");
        continue;
      }

      let room = Room {
        id:         Uuid::new_v4(),
        code,
        title:      input.title,
        set_id:     input.set_id,
        is_active:  true,
        created_at: Utc::now(),
        closed_at:  None,
      };
      state.rooms.push(room.clone());
      return Ok(room);
    }

    Err(Error::RoomCodeExhausted(MAX_CODE_ATTEMPTS))
  }

  async fn get_room(&self, id: Uuid) -> Result<Option<Room>> {
    Ok(self.inner.lock().await.room(id).cloned())
  }

  async fn get_room_by_code(&self, code: String) -> Result<Option<Room>> {
    let state = self.inner.lock().await;
    Ok(state.rooms.iter().find(|r| r.code == code).cloned())
  }

  async fn list_rooms(&self) -> Result<Vec<Room>> {
    let state = self.inner.lock().await;
    let mut rooms: Vec<Room> = state.rooms.iter().rev().cloned().collect();
    // Stable, so rooms created within the same instant stay newest first.
    rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rooms)
  }

  async fn update_room(&self, id: Uuid, update: RoomUpdate) -> Result<Option<Room>> {
    let mut state = self.inner.lock().await;
    let Some(room) = state.rooms.iter_mut().find(|r| r.id == id) else {
      return Ok(None);
    };
    room.apply(&update, Utc::now());
    Ok(Some(room.clone()))
  }

  // ── Answers ───────────────────────────────────────────────────────────────

  async fn upsert_answer(
    &self,
    session_id:  SessionId,
    room_id:     Uuid,
    scenario_id: ScenarioId,
    value:       AnswerValue,
  ) -> Result<Option<AnswerValue>> {
    let mut state = self.inner.lock().await;
    if state.room(room_id).is_none() {
      return Err(Error::UnknownRoom(room_id));
    }

    let now = Utc::now();
    state.touch_session(&session_id, now);

    let key = (session_id.clone(), room_id, scenario_id.clone());
    let answer = Answer {
      session_id,
      room_id,
      scenario_id: scenario_id.clone(),
      value,
      answered_at: now,
    };
    let previous = state.answers.insert(key, answer).map(|a| a.value);

    state.adjust_aggregate(room_id, &scenario_id, Delta::between(previous, Some(value)));
    Ok(previous)
  }

  async fn delete_answer(
    &self,
    session_id:  SessionId,
    room_id:     Uuid,
    scenario_id: ScenarioId,
  ) -> Result<Option<AnswerValue>> {
    let mut state = self.inner.lock().await;

    let key = (session_id, room_id, scenario_id);
    let Some(removed) = state.answers.remove(&key) else {
      return Ok(None);
    };

    let (_, room_id, scenario_id) = key;
    state.adjust_aggregate(room_id, &scenario_id, Delta::between(Some(removed.value), None));
    Ok(Some(removed.value))
  }

  async fn session_answers(
    &self,
    session_id: SessionId,
    room_id:    Uuid,
  ) -> Result<Vec<Answer>> {
    let state = self.inner.lock().await;
    let mut answers: Vec<Answer> = state
      .answers
      .values()
      .filter(|a| a.session_id == session_id && a.room_id == room_id)
      .cloned()
      .collect();
    answers.sort_by(|a, b| a.scenario_id.cmp(&b.scenario_id));
    Ok(answers)
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn room_aggregates(&self, room_id: Uuid) -> Result<Aggregates> {
    Ok(self.inner.lock().await.aggregates_where(|id| id == room_id))
  }

  async fn global_aggregates(&self) -> Result<Aggregates> {
    Ok(self.inner.lock().await.aggregates_where(|_| true))
  }
}
