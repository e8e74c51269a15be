//! Validated answer operations.
//!
//! These are the entry points the HTTP layer uses. Each one resolves the room
//! before touching the answer set, so a write against an unknown or closed
//! room fails with [`Error::RoomNotFound`] and leaves nothing behind.
//! Identifier and answer parsing happens before this layer (see
//! [`SessionId::parse`], [`ScenarioId::parse`], [`AnswerValue::parse`]), so
//! malformed input is always reported ahead of a missing room.

use uuid::Uuid;

use crate::{
  Error, Result,
  answer::{Answer, AnswerValue, ScenarioId, SessionId},
  room::{Room, normalize_room_code},
  store::SwipeStore,
  tally::{Aggregates, Transition},
};

// ─── Room resolution ─────────────────────────────────────────────────────────

/// How a caller names a room: by id, by human-entered code, or both (the id
/// wins). Blank values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomSelector<'a> {
  pub id:   Option<&'a str>,
  pub code: Option<&'a str>,
}

impl<'a> RoomSelector<'a> {
  pub fn new(id: Option<&'a str>, code: Option<&'a str>) -> Self {
    Self { id: present(id), code: present(code) }
  }

  pub fn is_empty(&self) -> bool { self.id.is_none() && self.code.is_none() }
}

fn present(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

/// Map a selector to a room record, open or closed.
///
/// A malformed id resolves to `None` rather than a validation error: from
/// the caller's point of view it simply names no room.
pub async fn resolve_room<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
) -> Result<Option<Room>> {
  let selector = RoomSelector::new(selector.id, selector.code);
  match (selector.id, selector.code) {
    (Some(id), _) => match Uuid::parse_str(id) {
      Ok(id) => store.get_room(id).await.map_err(Error::persistence),
      Err(_) => Ok(None),
    },
    (None, Some(code)) => store
      .get_room_by_code(normalize_room_code(code))
      .await
      .map_err(Error::persistence),
    (None, None) => {
      Err(Error::Validation("roomId or roomCode is required".to_owned()))
    }
  }
}

/// A room that exists, in any state. Used by reads.
async fn existing_room<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
) -> Result<Room> {
  resolve_room(store, selector).await?.ok_or(Error::RoomNotFound)
}

/// A room that still accepts answers. Used by writes.
async fn open_room<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
) -> Result<Room> {
  existing_room(store, selector)
    .await
    .and_then(|room| if room.is_active { Ok(room) } else { Err(Error::RoomNotFound) })
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Record `value` for the triple. Safe to retry: resubmitting the same value
/// is a zero-delta re-affirmation.
pub async fn submit_answer<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
  session_id: SessionId,
  scenario_id: ScenarioId,
  value: AnswerValue,
) -> Result<Transition> {
  let room = open_room(store, selector).await?;
  let previous = store
    .upsert_answer(session_id, room.id, scenario_id, value)
    .await
    .map_err(Error::persistence)?;
  Ok(Transition::new(previous, Some(value)))
}

/// Undo the answer for the triple. Undoing an answer that does not exist is
/// a successful no-op.
pub async fn undo_answer<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
  session_id: SessionId,
  scenario_id: ScenarioId,
) -> Result<Transition> {
  let room = open_room(store, selector).await?;
  let removed = store
    .delete_answer(session_id, room.id, scenario_id)
    .await
    .map_err(Error::persistence)?;
  Ok(Transition::new(removed, None))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub async fn session_answers<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
  session_id: SessionId,
) -> Result<Vec<Answer>> {
  let room = existing_room(store, selector).await?;
  store
    .session_answers(session_id, room.id)
    .await
    .map_err(Error::persistence)
}

/// Aggregates for the selected room, or for every room when the selector is
/// empty.
pub async fn aggregates<S: SwipeStore>(
  store: &S,
  selector: RoomSelector<'_>,
) -> Result<Aggregates> {
  let selector = RoomSelector::new(selector.id, selector.code);
  if selector.is_empty() {
    return store.global_aggregates().await.map_err(Error::persistence);
  }
  let room = existing_room(store, selector).await?;
  store
    .room_aggregates(room.id)
    .await
    .map_err(Error::persistence)
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use chrono::Utc;

  use super::*;
  use crate::room::{NewRoom, RoomUpdate};

  // A store that only knows rooms and counts answer writes, for exercising
  // resolution rules without a backend.
  struct RoomsOnly {
    rooms:  Mutex<Vec<Room>>,
    writes: AtomicUsize,
  }

  impl RoomsOnly {
    fn with(rooms: Vec<Room>) -> Self {
      Self { rooms: Mutex::new(rooms), writes: AtomicUsize::new(0) }
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("unused")]
  struct Unused;

  impl SwipeStore for RoomsOnly {
    type Error = Unused;
    async fn ensure_session(&self, _: SessionId) -> Result<(), Unused> { unimplemented!() }
    async fn create_room(&self, _: NewRoom) -> Result<Room, Unused> { unimplemented!() }
    async fn get_room(&self, id: Uuid) -> Result<Option<Room>, Unused> {
      Ok(self.rooms.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
    async fn get_room_by_code(&self, code: String) -> Result<Option<Room>, Unused> {
      Ok(self.rooms.lock().unwrap().iter().find(|r| r.code == code).cloned())
    }
    async fn list_rooms(&self) -> Result<Vec<Room>, Unused> { unimplemented!() }
    async fn update_room(&self, _: Uuid, _: RoomUpdate) -> Result<Option<Room>, Unused> { unimplemented!() }
    async fn upsert_answer(&self, _: SessionId, _: Uuid, _: ScenarioId, _: AnswerValue) -> Result<Option<AnswerValue>, Unused> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      Ok(None)
    }
    async fn delete_answer(&self, _: SessionId, _: Uuid, _: ScenarioId) -> Result<Option<AnswerValue>, Unused> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      Ok(None)
    }
    async fn session_answers(&self, _: SessionId, _: Uuid) -> Result<Vec<Answer>, Unused> { Ok(Vec::new()) }
    async fn room_aggregates(&self, _: Uuid) -> Result<Aggregates, Unused> { Ok(Aggregates::default()) }
    async fn global_aggregates(&self) -> Result<Aggregates, Unused> {
      Ok(Aggregates { total_participants: 42, ..Aggregates::default() })
    }
  }

  fn room(code: &str, is_active: bool) -> Room {
    Room {
      id: Uuid::new_v4(),
      code: code.into(),
      title: "Room".into(),
      set_id: "default".into(),
      is_active,
      created_at: Utc::now(),
      closed_at: None,
    }
  }

  fn ids() -> (SessionId, ScenarioId) {
    (SessionId::parse("s1").unwrap(), ScenarioId::parse("q1").unwrap())
  }

  #[tokio::test]
  async fn resolves_by_code_case_insensitively() {
    let open = room("ABC234", true);
    let store = RoomsOnly::with(vec![open.clone()]);
    let found = resolve_room(&store, RoomSelector::new(None, Some(" abc234 ")))
      .await
      .unwrap();
    assert_eq!(found, Some(open));
  }

  #[tokio::test]
  async fn id_takes_precedence_over_code() {
    let a = room("AAAAAA", true);
    let b = room("BBBBBB", true);
    let store = RoomsOnly::with(vec![a.clone(), b]);
    let id = a.id.to_string();
    let found = resolve_room(&store, RoomSelector::new(Some(&id), Some("BBBBBB")))
      .await
      .unwrap();
    assert_eq!(found.map(|r| r.id), Some(a.id));
  }

  #[tokio::test]
  async fn malformed_id_names_no_room() {
    let store = RoomsOnly::with(vec![room("ABC234", true)]);
    let found = resolve_room(&store, RoomSelector::new(Some("not-a-uuid"), None))
      .await
      .unwrap();
    assert!(found.is_none());
  }

  #[tokio::test]
  async fn empty_selector_is_a_validation_error() {
    let store = RoomsOnly::with(vec![]);
    let err = resolve_room(&store, RoomSelector::new(Some(""), Some("  ")))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[tokio::test]
  async fn unresolved_room_writes_nothing() {
    let store = RoomsOnly::with(vec![room("ABC234", true)]);
    let (session, scenario) = ids();
    let err = submit_answer(
      &store,
      RoomSelector::new(None, Some("ZZZZZZ")),
      session,
      scenario,
      AnswerValue::Yes,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::RoomNotFound));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn closed_room_rejects_writes_but_serves_reads() {
    let closed = room("CLOSED", false);
    let store = RoomsOnly::with(vec![closed]);
    let selector = RoomSelector::new(None, Some("CLOSED"));

    let (session, scenario) = ids();
    let err = undo_answer(&store, selector, session.clone(), scenario)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::RoomNotFound));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);

    assert!(aggregates(&store, selector).await.is_ok());
    assert!(session_answers(&store, selector, session).await.is_ok());
  }

  #[tokio::test]
  async fn submit_reports_transition() {
    let store = RoomsOnly::with(vec![room("ABC234", true)]);
    let (session, scenario) = ids();
    let transition = submit_answer(
      &store,
      RoomSelector::new(None, Some("ABC234")),
      session,
      scenario,
      AnswerValue::No,
    )
    .await
    .unwrap();
    assert_eq!(transition, Transition::new(None, Some(AnswerValue::No)));
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn empty_selector_reads_global_aggregates() {
    let store = RoomsOnly::with(vec![]);
    let agg = aggregates(&store, RoomSelector::default()).await.unwrap();
    assert_eq!(agg.total_participants, 42);
  }
}
